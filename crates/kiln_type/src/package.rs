use std::collections::HashMap;

use crate::object::ObjectId;

/// Maps package-level objects to the package that declares them.
///
/// Used for symbol mangling and to tell package-level variables apart from
/// function-local ones.
#[derive(Debug, Clone, Default)]
pub struct PackageSymbolTable {
  owners: HashMap<ObjectId, String>,
}

impl PackageSymbolTable {
  pub fn new() -> Self {
    Self { owners: HashMap::new() }
  }

  pub fn insert(
    &mut self,
    object: ObjectId,
    package: &str,
  ) {
    self.owners.insert(object, package.to_string());
  }

  pub fn package_of(
    &self,
    object: &ObjectId,
  ) -> Option<&str> {
    self.owners.get(object).map(|s| s.as_str())
  }

  pub fn is_package_level(
    &self,
    object: &ObjectId,
  ) -> bool {
    self.owners.contains_key(object)
  }
}
