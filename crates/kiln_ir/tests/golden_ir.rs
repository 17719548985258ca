mod common;

use insta::assert_snapshot;
use kiln_ir::{
  display::{format_symbol_table, print_module, symbol_rows},
  eval::{Machine, Value},
  verify_module,
};

#[test]
fn ir_module_text() {
  let sample = common::sample_module();

  assert_snapshot!(print_module(&sample.module), @r###"
  ; module main

  type main.Point = {i64, i64}

  @main.count = external global i64 3

  declare external void @io.print(str %p0)

  define external i64 @main.add(i64 %p0, i64 %p1) {
  entry_0:
    %t0 = add %p0, %p1
    ret %t0
  }

  define external void @2() {
  entry_0:
    %t0 = load @main.count
    %t1 = add %t0, i64 1  ; next
    store %t1, @main.count
    call @io.print(str "hi")
    ret void
  }
  "###);
}

#[test]
fn ir_symbol_rows() {
  let sample = common::sample_module();
  let rows = symbol_rows(&sample.module);

  let expected: Vec<Vec<String>> = [
    ["global", "main.count", "i64", "external"],
    ["declare", "io.print", "void (str)", "external"],
    ["define", "main.add", "i64 (i64, i64)", "external"],
    ["define", "<2>", "void ()", "external"],
    ["type", "main.Point", "{i64, i64}", ""],
  ]
  .iter()
  .map(|row| row.iter().map(|s| s.to_string()).collect())
  .collect();

  assert_eq!(rows, expected);
}

#[test]
fn ir_symbol_table_has_a_header_and_a_line_per_symbol() {
  let sample = common::sample_module();
  let table = format_symbol_table(&sample.module);

  let header = table.lines().find(|line| line.contains("Kind")).unwrap();
  assert!(header.contains("Name") && header.contains("Linkage"));
  assert_eq!(table.lines().filter(|line| line.contains("main.")).count(), 3);
  assert!(table.contains("io.print"));
}

#[test]
fn ir_sample_verifies_and_runs() {
  let sample = common::sample_module();
  assert_eq!(verify_module(&sample.module), Ok(()));

  let mut machine = Machine::new(&sample.module);
  let sum = machine.call(sample.add, vec![Value::Int(2), Value::Int(40)]).unwrap();
  assert_eq!(sum, Some(Value::Int(42)));

  machine.call(sample.init, vec![]).unwrap();
  assert_eq!(machine.global("main.count"), Some(Value::Int(4)));
  assert_eq!(machine.calls().len(), 1);
  assert_eq!(machine.calls()[0].args, vec![Value::Str("hi".into())]);
}
