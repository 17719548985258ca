mod common;

use insta::assert_snapshot;
use kiln_ir::{
  ConstValue, IrType,
  display::print_module,
  eval::{Machine, Value},
};
use kiln_type::op::BinaryOperation;

#[test]
fn constant_group_is_folded_without_initializer() {
  let common::Fixture { sources, mut builder } = common::fixture();
  let int = builder.types().int();
  let string = builder.types().string();

  let x = builder.global("x", int);
  let s = builder.global("s", string);
  let one = builder.int(1);
  let two = builder.int(2);
  let sum = builder.binary(BinaryOperation::Add, one, two);
  let hi = builder.string("hi");
  let decl = builder.var_decl(&[x, s], vec![sum, hi]);
  builder.push(decl);
  let pkg = builder.finish();

  let output = common::lower(&pkg, &sources);
  common::assert_clean(&output);

  assert!(output.var_init_funcs.is_empty());
  assert_eq!(output.module.functions.len(), 0);

  let module = &output.module;
  let x = module.named_global("main.x").unwrap();
  let s = module.named_global("main.s").unwrap();
  assert_eq!(module.global(&x).initializer, ConstValue::Int(3, IrType::I64));
  assert_eq!(module.global(&s).initializer, ConstValue::Str("hi".to_string()));
}

#[test]
fn side_effecting_group_runs_once_in_source_order() {
  let common::Fixture { sources, mut builder } = common::fixture();
  let int = builder.types().int();

  let tick = builder.imported_func("io", "Tick", &[], &[("", int)]);
  let x = builder.global("X", int);
  let y = builder.global("Y", int);

  let y_ref = builder.ident(y);
  let call = builder.call(tick, vec![]);
  let sum = builder.binary(BinaryOperation::Add, y_ref, call);
  let five = builder.int(5);
  let decl = builder.var_decl(&[x, y], vec![sum, five]);
  builder.push(decl);
  let pkg = builder.finish();

  let output = common::lower(&pkg, &sources);
  common::assert_clean(&output);

  assert_eq!(output.var_init_funcs.len(), 1);
  let module = &output.module;
  let y_id = module.named_global("main.Y").unwrap();
  assert_eq!(module.global(&y_id).initializer, ConstValue::Int(5, IrType::I64));
  assert_eq!(
    common::stored_globals(module, &output.var_init_funcs[0]),
    vec!["main.X".to_string(), "main.Y".to_string()]
  );

  let mut machine = Machine::new(module);
  machine.stub("io.Tick", Value::Int(10));
  common::run_inits(&mut machine, &output);

  assert_eq!(machine.call_count("io.Tick"), 1);
  assert_eq!(machine.global("main.X"), Some(Value::Int(15)));
  assert_eq!(machine.global("main.Y"), Some(Value::Int(5)));
}

#[test]
fn forward_reference_initializes_dependency_first() {
  let common::Fixture { sources, mut builder } = common::fixture();
  let int = builder.types().int();

  let tick = builder.imported_func("io", "Tick", &[], &[("", int)]);
  let x = builder.global("X", int);
  let y = builder.global("Y", int);

  let y_ref = builder.ident(y);
  let first = builder.call(tick, vec![]);
  let sum = builder.binary(BinaryOperation::Add, y_ref, first);
  let x_decl = builder.var_decl(&[x], vec![sum]);
  builder.push(x_decl);

  let second = builder.call(tick, vec![]);
  let y_decl = builder.var_decl(&[y], vec![second]);
  builder.push(y_decl);
  let pkg = builder.finish();

  let output = common::lower(&pkg, &sources);
  common::assert_clean(&output);

  let module = &output.module;
  assert_eq!(output.var_init_funcs.len(), 2);
  assert_eq!(module.globals.len(), 2);
  assert_eq!(common::stored_globals(module, &output.var_init_funcs[0]), vec!["main.Y".to_string()]);
  assert_eq!(common::stored_globals(module, &output.var_init_funcs[1]), vec!["main.X".to_string()]);

  let mut machine = Machine::new(module);
  machine.stub("io.Tick", Value::Int(10));
  common::run_inits(&mut machine, &output);

  assert_eq!(machine.call_count("io.Tick"), 2);
  assert_eq!(machine.global("main.Y"), Some(Value::Int(10)));
  assert_eq!(machine.global("main.X"), Some(Value::Int(20)));
}

#[test]
fn multi_value_initializer_is_called_once() {
  let common::Fixture { sources, mut builder } = common::fixture();
  let int = builder.types().int();
  let string = builder.types().string();

  let pair = builder.imported_func("io", "Pair", &[], &[("", int), ("", string)]);
  let a = builder.global("A", int);
  let b = builder.global("B", string);
  let call = builder.call(pair, vec![]);
  let decl = builder.var_decl(&[a, b], vec![call]);
  builder.push(decl);
  let pkg = builder.finish();

  let output = common::lower(&pkg, &sources);
  common::assert_clean(&output);

  let module = &output.module;
  let a_id = module.named_global("main.A").unwrap();
  assert_eq!(module.global(&a_id).initializer, ConstValue::Undef(IrType::I64));
  assert_eq!(output.var_init_funcs.len(), 1);

  let mut machine = Machine::new(module);
  machine.stub(
    "io.Pair",
    Value::Tuple(vec![Value::Int(7), Value::Str("seven".to_string())]),
  );
  common::run_inits(&mut machine, &output);

  assert_eq!(machine.call_count("io.Pair"), 1);
  assert_eq!(machine.global("main.A"), Some(Value::Int(7)));
  assert_eq!(machine.global("main.B"), Some(Value::Str("seven".to_string())));
}

#[test]
fn blank_initializer_still_runs() {
  let common::Fixture { sources, mut builder } = common::fixture();
  let int = builder.types().int();

  let tick = builder.imported_func("io", "Tick", &[], &[("", int)]);
  let blank = builder.global("_", int);
  let call = builder.call(tick, vec![]);
  let decl = builder.var_decl(&[blank], vec![call]);
  builder.push(decl);
  let pkg = builder.finish();

  let output = common::lower(&pkg, &sources);
  common::assert_clean(&output);

  assert!(output.module.globals.is_empty());

  let mut machine = Machine::new(&output.module);
  common::run_inits(&mut machine, &output);
  assert_eq!(machine.call_count("io.Tick"), 1);
}

#[test]
fn repeated_declaration_binds_storage_once() {
  let common::Fixture { sources, mut builder } = common::fixture();
  let int = builder.types().int();

  let tick = builder.imported_func("io", "Tick", &[], &[("", int)]);
  let x = builder.global("x", int);
  let call = builder.call(tick, vec![]);
  let decl = builder.var_decl(&[x], vec![call]);
  builder.push(decl.clone());
  builder.push(decl);
  let pkg = builder.finish();

  let output = common::lower(&pkg, &sources);
  common::assert_clean(&output);

  assert_eq!(output.module.globals.len(), 1);
  assert_eq!(output.var_init_funcs.len(), 1);
}

#[test]
fn global_attributes_rename_and_relink() {
  let common::Fixture { sources, mut builder } = common::fixture();
  let int = builder.types().int();

  let x = builder.global("x", int);
  let one = builder.int(1);
  builder.doc(&["counter storage", "#kiln name: runtime_counter", "#kiln linkage: internal"]);
  let decl = builder.var_decl(&[x], vec![one]);
  builder.push(decl);
  let pkg = builder.finish();

  let output = common::lower(&pkg, &sources);
  common::assert_clean(&output);

  let module = &output.module;
  assert!(module.named_global("main.x").is_none());
  let id = module.named_global("runtime_counter").unwrap();
  assert_eq!(module.global(&id).linkage, kiln_ir::Linkage::Internal);
}

#[test]
fn var_initializer_ir() {
  let common::Fixture { sources, mut builder } = common::fixture();
  let int = builder.types().int();

  let tick = builder.imported_func("io", "Tick", &[], &[("", int)]);
  let x = builder.global("X", int);
  let call = builder.call(tick, vec![]);
  let decl = builder.var_decl(&[x], vec![call]);
  builder.push(decl);
  let pkg = builder.finish();

  let output = common::lower(&pkg, &sources);
  common::assert_clean(&output);

  assert_snapshot!(print_module(&output.module), @r###"
  ; module main

  @main.X = external global i64 zeroinitializer

  define external void @0() {
  entry_0:
    %t0 = call @io.Tick()
    store %t0, @main.X
    ret void
  }

  declare external i64 @io.Tick()
  "###);
}
