// Copyright (C) 2025 Ryan Daum <ryan.daum@gmail.com> This program is free
// software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, version
// 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Whole programs, built as trees, compiled, assembled and executed.

use calligraphy_compiler::{
    ArithOp, AstBuilder, BuildError, Comparator, CompileError, CompileOptions, Program, Stmt,
};
use calligraphy_sandbox::{RunError, Sandbox, run_program, run_program_with};
use pretty_assertions::assert_eq;
use test_case::test_case;

fn print_text(b: &mut AstBuilder, text: &str) -> Stmt {
    let text = b.string(text);
    b.print(text)
}

/// `for (number <var> = <from>; <var> <op> <bound>; <var>++ or --) print(<var>)`
fn counting_loop(
    b: &mut AstBuilder,
    var: &str,
    from: i32,
    op: Comparator,
    bound: i32,
    up: bool,
) -> Stmt {
    let start = b.int(from);
    let init = b.declare("number", var, Some(start));
    let left = b.var(var);
    let right = b.int(bound);
    let condition = b.loop_condition(op, left, right);
    let step = if up { b.increment(var) } else { b.decrement(var) };
    let read = b.var(var);
    let print = b.print(read);
    b.for_(init, condition, step, vec![print])
}

#[test]
fn test_hello_world() {
    let mut b = AstBuilder::new();
    let hello = b.string("Hello World!");
    let decl = b.declare("rope", "greeting", Some(hello));
    let read = b.var("greeting");
    let print = b.print(read);
    let program = b.program(vec![], vec![decl, print]);

    assert_eq!(run_program(&program).unwrap(), vec!["Hello World!"]);
}

#[test]
fn test_increasing_and_decreasing_loops() {
    let mut b = AstBuilder::new();
    let up_banner = print_text(&mut b, "increasing for loop");
    let up = counting_loop(&mut b, "i", 0, Comparator::Lt, 10, true);
    let down_banner = print_text(&mut b, "decreasing for loop");
    let down = counting_loop(&mut b, "j", 9, Comparator::Gt, -1, false);
    let program = b.program(vec![], vec![up_banner, up, down_banner, down]);

    let mut expected = vec!["increasing for loop".to_string()];
    expected.extend((0..10).map(|n| n.to_string()));
    expected.push("decreasing for loop".to_string());
    expected.extend((0..10).rev().map(|n| n.to_string()));

    let output = run_program(&program).unwrap();
    assert_eq!(output.len(), 21);
    assert_eq!(output, expected);
}

#[test]
fn test_method_declared_after_its_caller() {
    let mut b = AstBuilder::new();
    // loud number first() { return second() + 1 }
    let call = b.call("second", vec![]);
    let one = b.int(1);
    let sum = b.binary(ArithOp::Add, call, one);
    let ret = b.ret(Some(sum));
    let first = b.method(Some("loud"), "number", "first", vec![], vec![ret]);
    // quite number second() { return 6 }
    let six = b.int(6);
    let ret = b.ret(Some(six));
    let second = b.method(Some("quite"), "number", "second", vec![], vec![ret]);

    let call = b.call("first", vec![]);
    let print = b.print(call);
    let program = b.program(vec![first, second], vec![print]);

    assert_eq!(run_program(&program).unwrap(), vec!["7"]);
}

fn classify_program(value: i32) -> Program {
    let mut b = AstBuilder::new();
    let param = b.param("number", "n");

    let n = b.var("n");
    let ten = b.int(10);
    let big = b.compare(Comparator::Gt, n, ten);
    let say_big = print_text(&mut b, "big");
    let first = b.arm(big, vec![say_big]);

    let n = b.var("n");
    let ten = b.int(10);
    let same = b.compare(Comparator::Eq, n, ten);
    let say_ten = print_text(&mut b, "ten");
    let second = b.arm(same, vec![say_ten]);

    let say_small = print_text(&mut b, "small");
    let chain = b.cond(vec![first, second], Some(vec![say_small]));
    let after = print_text(&mut b, "done");
    let classify = b.method(
        Some("loud"),
        "nothing",
        "classify",
        vec![param],
        vec![chain, after],
    );

    let arg = b.int(value);
    let call = b.call_stmt("classify", vec![arg]);
    b.program(vec![classify], vec![call])
}

#[test_case(11, "big"; "then branch")]
#[test_case(10, "ten"; "else if branch")]
#[test_case(3, "small"; "else branch")]
#[test_case(-200, "small"; "negative")]
fn test_only_one_branch_runs(value: i32, expected: &str) {
    let output = run_program(&classify_program(value)).unwrap();
    assert_eq!(output, vec![expected, "done"]);
}

#[test]
fn test_recursive_factorial() {
    let mut b = AstBuilder::new();
    let param = b.param("number", "n");
    let n = b.var("n");
    let two = b.int(2);
    let small = b.compare(Comparator::Lt, n, two);
    let one = b.int(1);
    let base = b.ret(Some(one));
    let arm = b.arm(small, vec![base]);
    let guard = b.cond(vec![arm], None);
    let n = b.var("n");
    let n_again = b.var("n");
    let one = b.int(1);
    let less = b.binary(ArithOp::Sub, n_again, one);
    let recurse = b.call("fact", vec![less]);
    let product = b.binary(ArithOp::Mul, n, recurse);
    let ret = b.ret(Some(product));
    let fact = b.method(Some("loud"), "number", "fact", vec![param], vec![guard, ret]);

    let mut statements = vec![];
    for value in [1, 5, 10] {
        let arg = b.int(value);
        let call = b.call("fact", vec![arg]);
        statements.push(b.print(call));
    }
    let program = b.program(vec![fact], statements);

    assert_eq!(
        run_program(&program).unwrap(),
        vec!["1", "120", "3628800"]
    );
}

#[test]
fn test_while_with_flag() {
    let mut b = AstBuilder::new();
    let yes = b.boolean(true);
    let going = b.declare("flag", "going", Some(yes));
    let three = b.int(3);
    let left = b.declare("number", "left", Some(three));

    let read = b.var("left");
    let print = b.print(read);
    let dec = b.decrement("left");
    let l = b.var("left");
    let zero = b.int(0);
    let done = b.compare(Comparator::Eq, l, zero);
    let no = b.boolean(false);
    let stop = b.assign("going", no);
    let arm = b.arm(done, vec![stop]);
    let check = b.cond(vec![arm], None);
    let condition = b.var("going");
    let lp = b.while_(condition, vec![print, dec, check]);
    let bye = print_text(&mut b, "landed");
    let program = b.program(vec![], vec![going, left, lp, bye]);

    assert_eq!(
        run_program(&program).unwrap(),
        vec!["3", "2", "1", "landed"]
    );
}

#[test]
fn test_double_arithmetic_and_comparison() {
    let mut b = AstBuilder::new();
    let price = b.double(2.5);
    let decl = b.declare("duplicate", "price", Some(price));
    let count = b.int(4);
    let count = b.declare("number", "count", Some(count));

    let p = b.var("price");
    let four = b.double(4.0);
    let total = b.binary(ArithOp::Mul, p, four);
    let print_total = b.print(total);

    let p = b.var("price");
    let two = b.double(2.0);
    let cheap = b.compare(Comparator::Gt, p, two);
    let print_cheap = b.print(cheap);

    let c = b.var("count");
    let print_count = b.print(c);
    let program = b.program(
        vec![],
        vec![decl, count, print_total, print_cheap, print_count],
    );

    assert_eq!(run_program(&program).unwrap(), vec!["10.0", "true", "4"]);
}

#[test]
fn test_modulo_and_grouping() {
    let mut b = AstBuilder::new();
    let l = b.int(17);
    let r = b.int(5);
    let rem = b.binary(ArithOp::Mod, l, r);
    let print_rem = b.print(rem);

    let one = b.int(1);
    let two = b.int(2);
    let sum = b.binary(ArithOp::Add, one, two);
    let grouped = b.paren(sum);
    let three = b.int(3);
    let product = b.binary(ArithOp::Mul, grouped, three);
    let print_product = b.print(product);
    let program = b.program(vec![], vec![print_rem, print_product]);

    assert_eq!(run_program(&program).unwrap(), vec!["2", "9"]);
}

#[test]
fn test_string_ordering() {
    let mut b = AstBuilder::new();
    let l = b.string("apple");
    let r = b.string("banana");
    let before = b.compare(Comparator::Lt, l, r);
    let say = print_text(&mut b, "in order");
    let arm = b.arm(before, vec![say]);
    let check = b.cond(vec![arm], None);

    let l = b.string("same");
    let r = b.string("same");
    let differ = b.compare(Comparator::Ne, l, r);
    let print = b.print(differ);
    let program = b.program(vec![], vec![check, print]);

    assert_eq!(run_program(&program).unwrap(), vec!["in order", "false"]);
}

#[test]
fn test_discarded_results_keep_the_stack_balanced() {
    let mut b = AstBuilder::new();
    let noise = print_text(&mut b, "side effect");
    let half = b.double(0.5);
    let ret = b.ret(Some(half));
    let noisy = b.method(Some("covered"), "duplicate", "noisy", vec![], vec![noise, ret]);
    let call = b.call_stmt("noisy", vec![]);
    let again = b.call_stmt("noisy", vec![]);
    let program = b.program(vec![noisy], vec![call, again]);

    assert_eq!(
        run_program(&program).unwrap(),
        vec!["side effect", "side effect"]
    );
}

#[test]
fn test_uninitialized_variables_read_as_zero() {
    let mut b = AstBuilder::new();
    let n = b.declare("number", "n", None);
    let d = b.declare("duplicate", "d", None);
    let f = b.declare("flag", "f", None);
    let s = b.declare("rope", "s", None);
    let mut statements = vec![n, d, f, s];
    for name in ["n", "d", "f", "s"] {
        let read = b.var(name);
        statements.push(b.print(read));
    }
    let program = b.program(vec![], statements);

    assert_eq!(run_program(&program).unwrap(), vec!["0", "0.0", "false", ""]);
}

#[test]
fn test_parameters_of_mixed_width() {
    let mut b = AstBuilder::new();
    let x = b.param("duplicate", "x");
    let label = b.param("rope", "label");
    let n = b.param("number", "n");
    let read_label = b.var("label");
    let print_label = b.print(read_label);
    let read_n = b.var("n");
    let print_n = b.print(read_n);
    let read_x = b.var("x");
    let print_x = b.print(read_x);
    let show = b.method(
        Some("loud"),
        "nothing",
        "show",
        vec![x, label, n],
        vec![print_label, print_n, print_x],
    );
    let a = b.double(0.125);
    let s = b.string("args");
    let i = b.int(300);
    let call = b.call_stmt("show", vec![a, s, i]);
    let program = b.program(vec![show], vec![call]);

    assert_eq!(run_program(&program).unwrap(), vec!["args", "300", "0.125"]);
}

#[test]
fn test_custom_class_name() {
    let mut b = AstBuilder::new();
    let hi = print_text(&mut b, "ahoy");
    let greet = b.method(Some("loud"), "nothing", "greet", vec![], vec![hi]);
    let call = b.call_stmt("greet", vec![]);
    let program = b.program(vec![greet], vec![call]);
    let options = CompileOptions {
        class_name: "Treasure".to_string(),
        ..CompileOptions::default()
    };

    let output = run_program_with(&program, options, &Sandbox::default()).unwrap();
    assert_eq!(output, vec!["ahoy"]);
}

#[test]
fn test_type_errors_stop_the_build() {
    let mut b = AstBuilder::new();
    let one = b.int(1);
    let text = b.string("one");
    let sum = b.binary(ArithOp::Add, one, text);
    let print = b.print(sum);
    let program = b.program(vec![], vec![print]);

    let err = run_program(&program).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::Compile(CompileError::TypeMismatch { .. }))
    ));
}

#[test]
fn test_runaway_loop_hits_step_limit() {
    let mut b = AstBuilder::new();
    let forever = b.boolean(true);
    let lp = b.while_(forever, vec![]);
    let program = b.program(vec![], vec![lp]);

    let sandbox = Sandbox::new().step_limit(1_000);
    let err = run_program_with(&program, CompileOptions::default(), &sandbox).unwrap_err();
    assert_eq!(err.downcast_ref::<RunError>(), Some(&RunError::StepLimit(1_000)));
}

#[test]
fn test_expression_parameter_keeps_later_arguments_in_place() {
    let mut b = AstBuilder::new();
    let five = b.int(5);
    let fixed = b.param_expr(five);
    let x = b.param("number", "x");
    let read = b.var("x");
    let print = b.print(read);
    let f = b.method(Some("loud"), "nothing", "f", vec![fixed, x], vec![print]);
    let one = b.int(1);
    let two = b.int(2);
    let call = b.call_stmt("f", vec![one, two]);
    let program = b.program(vec![f], vec![call]);

    assert_eq!(run_program(&program).unwrap(), vec!["2"]);
}

#[test]
fn test_nan_compares_false_except_not_equal() {
    let mut b = AstBuilder::new();
    let zero = b.double(0.0);
    let also_zero = b.double(0.0);
    let nan = b.binary(ArithOp::Mod, zero, also_zero);
    let decl = b.declare("duplicate", "z", Some(nan));
    let mut statements = vec![decl];
    for op in [Comparator::Gt, Comparator::Lt, Comparator::Eq, Comparator::Ne] {
        let z = b.var("z");
        let one = b.double(1.0);
        let cmp = b.compare(op, z, one);
        statements.push(b.print(cmp));
    }
    let z = b.var("z");
    let one = b.double(1.0);
    let above = b.compare(Comparator::Gt, z, one);
    let say = print_text(&mut b, "wrongly above");
    let arm = b.arm(above, vec![say]);
    statements.push(b.cond(vec![arm], None));
    let program = b.program(vec![], statements);

    assert_eq!(
        run_program(&program).unwrap(),
        vec!["false", "false", "false", "true"]
    );
}
