//! Declaration attributes written as doc lines, e.g. `#kiln linkage: internal`.

use kiln_ir::{FnAttribute, FuncId, GlobalId, Linkage};

use crate::{
  context::LowerCtx,
  error::{LowerError, LowerResult},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
  /// Overrides the symbol name.
  Name(String),
  Linkage(Linkage),
  Attr(FnAttribute),
}

fn invalid(
  directive: &str,
  reason: &str,
) -> LowerError {
  LowerError::InvalidAttribute {
    directive: directive.to_string(),
    reason: reason.to_string(),
  }
}

/// Parses every doc line that starts with `prefix`. Other lines are ignored.
pub fn parse_attributes(
  doc: &[String],
  prefix: &str,
) -> LowerResult<Vec<Attribute>> {
  let mut attributes = Vec::new();

  for line in doc {
    let Some(rest) = line.trim().strip_prefix(prefix) else {
      continue;
    };
    let rest = rest.trim();

    let Some((directive, value)) = rest.split_once(':') else {
      return Err(invalid(rest, "expected 'directive: value'"));
    };
    let directive = directive.trim();
    let value = value.trim();

    let attribute = match directive {
      "name" => {
        if value.is_empty() || value.contains(char::is_whitespace) {
          return Err(invalid(directive, "expected a single symbol name"));
        }
        Attribute::Name(value.to_string())
      },
      "linkage" => match value {
        "external" => Attribute::Linkage(Linkage::External),
        "internal" => Attribute::Linkage(Linkage::Internal),
        "weak" => Attribute::Linkage(Linkage::Weak),
        _ => return Err(invalid(directive, &format!("unknown linkage '{}'", value))),
      },
      "attr" => match value {
        "noinline" => Attribute::Attr(FnAttribute::NoInline),
        "alwaysinline" => Attribute::Attr(FnAttribute::AlwaysInline),
        "noreturn" => Attribute::Attr(FnAttribute::NoReturn),
        _ => return Err(invalid(directive, &format!("unknown function attribute '{}'", value))),
      },
      _ => return Err(invalid(directive, "unknown directive")),
    };

    attributes.push(attribute);
  }

  Ok(attributes)
}

impl<'a> LowerCtx<'a> {
  pub fn parse_doc_attributes(
    &self,
    doc: &[String],
  ) -> LowerResult<Vec<Attribute>> {
    parse_attributes(doc, &self.config.lower.attribute_prefix)
  }

  pub fn apply_function_attributes(
    &mut self,
    func: FuncId,
    attributes: &[Attribute],
  ) {
    for attribute in attributes {
      match attribute {
        Attribute::Name(name) => self.module.rename_function(&func, name),
        Attribute::Linkage(linkage) => self.module.function_mut(&func).linkage = *linkage,
        Attribute::Attr(attr) => {
          let attrs = &mut self.module.function_mut(&func).attributes;
          if !attrs.contains(attr) {
            attrs.push(*attr);
          }
        },
      }
    }
  }

  pub fn apply_global_attributes(
    &mut self,
    global: GlobalId,
    attributes: &[Attribute],
  ) -> LowerResult<()> {
    for attribute in attributes {
      match attribute {
        Attribute::Name(name) => self.module.rename_global(&global, name),
        Attribute::Linkage(linkage) => self.module.global_mut(&global).linkage = *linkage,
        Attribute::Attr(attr) => {
          return Err(invalid("attr", &format!("'{}' only applies to functions", attr)));
        },
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn doc(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|l| l.to_string()).collect()
  }

  #[test]
  fn test_parse_known_directives() {
    let attributes = parse_attributes(
      &doc(&[
        "Adds two numbers.",
        "#kiln name: add_impl",
        "  #kiln linkage: weak",
        "#kiln attr: noinline",
      ]),
      "#kiln",
    )
    .unwrap();

    assert_eq!(
      attributes,
      vec![
        Attribute::Name("add_impl".into()),
        Attribute::Linkage(Linkage::Weak),
        Attribute::Attr(FnAttribute::NoInline),
      ]
    );
  }

  #[test]
  fn test_unknown_directive_is_rejected() {
    let err = parse_attributes(&doc(&["#kiln section: .text"]), "#kiln").unwrap_err();
    assert_eq!(
      err,
      LowerError::InvalidAttribute {
        directive: "section".into(),
        reason: "unknown directive".into(),
      }
    );
  }

  #[test]
  fn test_prefix_is_configurable() {
    let attributes = parse_attributes(&doc(&["#kiln name: a", "@llvm name: b"]), "@llvm").unwrap();
    assert_eq!(attributes, vec![Attribute::Name("b".into())]);
  }
}
