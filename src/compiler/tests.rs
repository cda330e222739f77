//! Unit tests for the analysis engine.
//!
//! Programs are written in the parser's JSON form and run through the Python
//! backend; the laid out text is compared as a whole.

use std::rc::Rc;

use pretty_assertions::assert_eq;
use serde_json::{json, Value as Json};

use crate::{
    ast::{
        ast::{parse_program, Node},
        types::{Operator, TypeTag},
    },
    backend::{backend::Backend, python::PythonBackend},
    errors::errors::Error,
    scope::scope::{KeywordValue, Signature},
};

use super::{
    compiler::{transpile, transpile_with, Compiler, CompilerConfig, Output},
    emitter::{Emitter, Target},
    expr::{reduce_operands, reorder_kwargs, result_type},
    imports::{MemoryResolver, ModuleResolver, ModuleSource},
    lowering::infer_return_type,
};

fn lit(value: &str, ty: &str) -> Json {
    json!({ "token": "literal", "value": value, "type": ty })
}

fn int(value: i64) -> Json {
    lit(&value.to_string(), "int")
}

fn var(name: &str) -> Json {
    json!({ "token": "var", "name": name })
}

fn expr(args: Vec<Json>, ops: &[&str]) -> Json {
    json!({ "args": args, "ops": ops })
}

fn single(arg: Json) -> Json {
    expr(vec![arg], &[])
}

fn assign(name: &str, value: Json) -> Json {
    json!({ "opcode": "assign", "target": var(name), "expr": value })
}

fn print(value: Json) -> Json {
    json!({ "opcode": "print", "expr": value })
}

fn call(name: &str, args: Vec<Json>) -> Json {
    json!({ "token": "call", "name": { "name": name }, "args": args })
}

fn ret(value: Json) -> Json {
    json!({ "opcode": "return", "expr": value })
}

fn program(nodes: Vec<Json>) -> Vec<Node> {
    parse_program(&Json::Array(nodes).to_string()).unwrap()
}

fn compile(nodes: Vec<Json>) -> Result<Output, Error> {
    transpile(&program(nodes), CompilerConfig::default())
}

fn python(nodes: Vec<Json>) -> String {
    compile(nodes).unwrap().assemble(&PythonBackend::new())
}

fn error_name(nodes: Vec<Json>) -> String {
    compile(nodes).unwrap_err().get_error_name().to_string()
}

fn compiler() -> Compiler {
    Compiler::new(CompilerConfig::default(), Rc::new(MemoryResolver::new()))
}

#[test]
fn test_reduce_operands_precedence() {
    let apply = |op: Operator, lhs: i64, rhs: i64| -> Result<i64, Error> {
        Ok(match op {
            Operator::Add => lhs + rhs,
            Operator::Sub => lhs - rhs,
            Operator::Mul => lhs * rhs,
            Operator::Pow => lhs.pow(rhs as u32),
            _ => unreachable!(),
        })
    };

    assert_eq!(
        reduce_operands(vec![2, 3, 4], vec![Operator::Add, Operator::Mul], apply).unwrap(),
        14
    );
    assert_eq!(
        reduce_operands(vec![10, 3, 2], vec![Operator::Sub, Operator::Sub], apply).unwrap(),
        5
    );
    assert_eq!(
        reduce_operands(vec![2, 2, 3], vec![Operator::Mul, Operator::Pow], apply).unwrap(),
        16
    );
    assert_eq!(reduce_operands(vec![7], vec![], apply).unwrap(), 7);
}

#[test]
fn test_reduce_operands_rejects_malformed_input() {
    let apply = |_: Operator, lhs: i64, _: i64| -> Result<i64, Error> { Ok(lhs) };

    let error = reduce_operands(vec![1, 2], vec![], apply).unwrap_err();
    assert_eq!(error.get_error_name(), "UnsupportedConstruct");

    let error = reduce_operands(vec![1, 2], vec![Operator::Not], apply).unwrap_err();
    assert_eq!(error.get_error_name(), "UnsupportedConstruct");
}

#[test]
fn test_result_types() {
    assert_eq!(result_type(Operator::Add, &TypeTag::Int, &TypeTag::Int), TypeTag::Int);
    assert_eq!(result_type(Operator::Mul, &TypeTag::Int, &TypeTag::Float), TypeTag::Float);
    assert_eq!(result_type(Operator::Div, &TypeTag::Int, &TypeTag::Int), TypeTag::Float);
    assert_eq!(result_type(Operator::Add, &TypeTag::Str, &TypeTag::Int), TypeTag::Unknown);
    assert_eq!(result_type(Operator::Less, &TypeTag::Str, &TypeTag::Str), TypeTag::Bool);
    assert_eq!(result_type(Operator::Or, &TypeTag::Unknown, &TypeTag::Int), TypeTag::Bool);
    assert_eq!(
        result_type(Operator::ShiftLeft, &TypeTag::Int, &TypeTag::Int),
        TypeTag::Int
    );
    assert_eq!(
        result_type(Operator::BitAnd, &TypeTag::Int, &TypeTag::Float),
        TypeTag::Unknown
    );
}

#[test]
fn test_assign_and_print() {
    let source = vec![
        assign("x", expr(vec![int(2), int(3), int(4)], &["+", "*"])),
        print(single(var("x"))),
    ];

    assert_eq!(python(source), "x: int = 2 + 3 * 4\nprint(x)\n");
}

#[test]
fn test_folded_operands_keep_their_grouping() {
    let source = vec![
        print(expr(vec![int(1), int(2), int(3)], &["==", "&"])),
        print(expr(vec![int(1), int(2), int(3)], &["<", "=="])),
        print(expr(vec![int(2), int(3), int(2)], &["**", "**"])),
        print(expr(vec![int(1), int(2), int(3)], &["-", "*"])),
    ];

    assert_eq!(
        python(source),
        [
            "print((1 == 2) & 3)",
            "print((1 < 2) == 3)",
            "print((2 ** 3) ** 2)",
            "print(1 - 2 * 3)",
            "",
        ]
        .join("\n")
    );
}

#[test]
fn test_declared_expression_type_wins() {
    let typed = |args: Vec<Json>, ops: &[&str]| json!({ "args": args, "ops": ops, "type": "float" });
    let source = vec![
        assign("x", typed(vec![int(1)], &[])),
        assign("y", typed(vec![int(1), int(2)], &["+"])),
        assign("z", typed(vec![int(1)], &["-"])),
    ];

    assert_eq!(
        python(source),
        "x: float = 1\ny: float = 1 + 2\nz: float = -1\n"
    );
}

#[test]
fn test_reassignment_is_not_annotated() {
    let source = vec![
        assign("x", single(int(1))),
        assign("x", expr(vec![var("x"), lit("0.5", "float")], &["+"])),
    ];

    assert_eq!(python(source), "x: int = 1\nx = x + 0.5\n");
}

#[test]
fn test_literal_without_type_is_typed_by_shape() {
    let source = vec![
        assign("a", single(lit("3.25", "unknown"))),
        assign("b", single(lit("true", "bool"))),
        assign("c", single(lit("\"hi {a}\"", "str"))),
    ];

    assert_eq!(
        python(source),
        "a: float = 3.25\nb: bool = True\nc: str = f\"hi {a}\"\n"
    );
}

#[test]
fn test_untyped_binding_is_not_recorded() {
    let source = vec![assign("x", single(call("mystery", vec![])))];
    let mut compiler = compiler();
    compiler.compile(&program(source)).unwrap();

    assert!(!compiler.scopes.contains("x"));
    assert_eq!(compiler.emitter.main(), ["x = mystery()"]);
}

#[test]
fn test_function_return_type_is_inferred() {
    let source = vec![
        json!({
            "opcode": "func",
            "name": "double",
            "args": [{ "name": "n", "type": "int" }],
            "block": [ret(expr(vec![var("n"), int(2)], &["*"]))]
        }),
        assign("y", single(call("double", vec![single(int(3))]))),
    ];

    assert_eq!(
        python(source),
        "def double(n: int) -> int:\n    return n * 2\n\ny: int = double(3)\n"
    );
}

#[test]
fn test_function_without_return_is_void() {
    let source = vec![json!({
        "opcode": "func",
        "name": "greet",
        "block": [print(single(lit("\"hello\"", "str")))]
    })];

    assert_eq!(
        python(source),
        "def greet() -> None:\n    print(f\"hello\")\n\n"
    );
}

#[test]
fn test_recursive_function_uses_first_known_return() {
    let source = vec![json!({
        "opcode": "func",
        "name": "fact",
        "args": [{ "name": "n", "type": "int" }],
        "block": [
            {
                "opcode": "if",
                "expr": expr(vec![var("n"), int(1)], &["<="]),
                "block": [ret(single(int(1)))]
            },
            ret(expr(
                vec![
                    var("n"),
                    call("fact", vec![expr(vec![var("n"), int(1)], &["-"])])
                ],
                &["*"]
            ))
        ]
    })];
    let output = compile(source).unwrap();

    assert_eq!(output.hoisted[0], "def fact(n: int) -> int:");
    assert_eq!(output.hoisted[4], "return n * fact(n - 1)");
}

#[test]
fn test_return_type_inference_is_idempotent() {
    let nodes = program(vec![json!({
        "opcode": "func",
        "name": "half",
        "args": [{ "name": "n", "type": "int" }],
        "block": [
            assign("h", expr(vec![var("n"), int(2)], &["/"])),
            ret(single(var("h")))
        ]
    })]);
    let Node::Func(func) = &nodes[0] else {
        panic!("expected a function");
    };
    let signature = Signature {
        args: func.args.clone(),
        kwargs: vec![],
    };

    let mut compiler = compiler();
    let first = infer_return_type(&mut compiler, func, &signature).unwrap();
    let second = infer_return_type(&mut compiler, func, &signature).unwrap();

    assert_eq!(first.ty, TypeTag::Float);
    assert_eq!(first, second);
    assert!(compiler.emitter.main().is_empty());
    assert!(compiler.emitter.hoisted().is_empty());
    assert!(!compiler.scopes.contains("h"));
}

#[test]
fn test_function_scope_does_not_leak() {
    let source = vec![
        json!({
            "opcode": "func",
            "name": "setup",
            "block": [assign("z", single(int(1)))]
        }),
        assign("z", single(lit("\"top\"", "str"))),
    ];
    let output = compile(source).unwrap();

    assert_eq!(output.main, vec!["z: str = f\"top\"".to_string()]);
}

#[test]
fn test_array_literal_unification() {
    let mut compiler = compiler();
    compiler
        .compile(&program(vec![assign(
            "xs",
            single(json!({ "token": "array", "elements": [int(1), lit("2.5", "float")] })),
        )]))
        .unwrap();

    let info = compiler.scopes.lookup("xs").unwrap();
    assert_eq!(info.ty, TypeTag::Array);
    assert_eq!(info.array.as_ref().unwrap().element_type, TypeTag::Float);
    assert_eq!(compiler.emitter.main(), ["xs: list = [1, 2.5]"]);
}

#[test]
fn test_array_errors() {
    let mixed = assign(
        "xs",
        single(json!({
            "token": "array",
            "elements": [int(1), lit("\"a\"", "str")]
        })),
    );
    assert_eq!(error_name(vec![mixed]), "UnsupportedConstruct");

    let empty = assign("xs", single(json!({ "token": "array", "elements": [] })));
    assert_eq!(error_name(vec![empty]), "UnknownTypeFallthrough");
}

#[test]
fn test_declared_element_type_seeds_empty_array() {
    let source = vec![
        json!({
            "opcode": "assign",
            "target": { "token": "var", "name": "xs", "type": "int" },
            "expr": single(json!({ "token": "array", "elements": [] }))
        }),
        json!({
            "opcode": "augAssign",
            "target": var("xs"),
            "operator": "+",
            "expr": single(int(4))
        }),
        assign("n", single(json!({
            "token": "dotAccess",
            "steps": [var("xs"), var("len")]
        }))),
        assign("first", single(json!({
            "token": "var",
            "name": "xs",
            "indexAccess": single(int(0))
        }))),
    ];

    assert_eq!(
        python(source),
        "xs: list = []\nxs.append(4)\nn: int = len(xs)\nfirst: int = xs[0]\n"
    );
}

#[test]
fn test_index_assignment_and_increment() {
    let indexed = || json!({ "token": "var", "name": "xs", "indexAccess": single(int(1)) });
    let source = vec![
        assign(
            "xs",
            single(json!({ "token": "array", "elements": [int(1), int(2)] })),
        ),
        json!({ "opcode": "assign", "target": indexed(), "expr": single(int(5)) }),
        json!({
            "opcode": "augAssign",
            "target": indexed(),
            "operator": "+",
            "expr": single(int(1))
        }),
    ];

    assert_eq!(
        python(source),
        "xs: list = [1, 2]\nxs[1] = 5\nxs[1] += 1\n"
    );
}

#[test]
fn test_index_on_non_array_is_unsupported() {
    let source = vec![
        assign("s", single(lit("\"abc\"", "str"))),
        assign(
            "c",
            single(json!({ "token": "var", "name": "s", "indexAccess": single(int(0)) })),
        ),
    ];

    assert_eq!(error_name(source), "UnsupportedConstruct");
}

#[test]
fn test_augmented_assignment_rules() {
    let counter = vec![
        assign("x", single(int(1))),
        json!({ "opcode": "augAssign", "target": var("x"), "operator": "+", "expr": single(int(2)) }),
    ];
    assert_eq!(python(counter), "x: int = 1\nx += 2\n");

    let minus = vec![
        assign("x", single(int(1))),
        json!({ "opcode": "augAssign", "target": var("x"), "operator": "-", "expr": single(int(2)) }),
    ];
    assert_eq!(error_name(minus), "UnsupportedConstruct");

    let text = vec![
        assign("s", single(lit("\"a\"", "str"))),
        json!({ "opcode": "augAssign", "target": var("s"), "operator": "+", "expr": single(lit("\"b\"", "str")) }),
    ];
    assert_eq!(error_name(text), "UnsupportedConstruct");
}

#[test]
fn test_prefix_operators() {
    let source = vec![
        assign("x", single(int(3))),
        assign("y", expr(vec![var("x")], &["-"])),
        assign("done", expr(vec![var("x")], &["not"])),
    ];
    assert_eq!(python(source), "x: int = 3\ny: int = -x\ndone: bool = not x\n");

    let unknown = vec![assign("y", expr(vec![var("ghost")], &["-"]))];
    assert_eq!(error_name(unknown), "UnknownTypeFallthrough");

    let bad = vec![
        assign("x", single(int(3))),
        assign("y", expr(vec![var("x")], &["*"])),
    ];
    assert_eq!(error_name(bad), "UnsupportedConstruct");
}

#[test]
fn test_control_flow_layout() {
    let source = vec![
        json!({
            "opcode": "for",
            "vars": [{ "name": "i" }],
            "iterable": { "token": "range", "from": single(int(0)), "to": single(int(10)) },
            "block": [
                {
                    "opcode": "if",
                    "expr": expr(vec![var("i"), int(5)], &[">"]),
                    "block": [{ "opcode": "break" }],
                    "elifs": [{
                        "expr": expr(vec![var("i"), int(2)], &["=="]),
                        "block": [assign("half", single(var("i")))]
                    }],
                    "else": [{ "opcode": "comment", "value": "# nothing" }]
                }
            ]
        }),
        json!({
            "opcode": "while",
            "expr": single(lit("false", "bool")),
            "block": []
        }),
    ];

    assert_eq!(
        python(source),
        [
            "for i in range(0, 10, 1):",
            "    if i > 5:",
            "        break",
            "    elif i == 2:",
            "        half: int = i",
            "    else:",
            "        pass",
            "while False:",
            "    pass",
            "",
        ]
        .join("\n")
    );
}

#[test]
fn test_range_step_and_promotion() {
    let mut compiler = compiler();
    compiler
        .compile(&program(vec![json!({
            "opcode": "for",
            "vars": [{ "name": "t" }],
            "iterable": {
                "token": "range",
                "from": single(int(0)),
                "step": single(lit("0.5", "float")),
                "to": single(int(3))
            },
            "block": []
        })]))
        .unwrap();

    assert_eq!(compiler.emitter.main()[0], "for t in range(0, 3, 0.5):");
    assert_eq!(compiler.scopes.lookup("t").unwrap().ty, TypeTag::Float);
}

#[test]
fn test_keyword_arguments_follow_declaration_order() {
    let source = vec![
        json!({
            "opcode": "func",
            "name": "scale",
            "type": "int",
            "args": [{ "name": "x", "type": "int" }],
            "kwargs": [
                { "target": { "name": "a" }, "expr": single(int(1)) },
                { "target": { "name": "b" }, "expr": single(int(2)) }
            ],
            "block": [ret(single(var("x")))]
        }),
        print(single(json!({
            "token": "call",
            "name": { "name": "scale" },
            "args": [single(int(0))],
            "kwargs": [{ "target": { "name": "b" }, "expr": single(int(5)) }]
        }))),
    ];
    let output = compile(source).unwrap();

    assert_eq!(output.hoisted[0], "def scale(x: int, a: int = 1, b: int = 2) -> int:");
    assert_eq!(output.main, vec!["print(scale(0, a=1, b=5))".to_string()]);
}

#[test]
fn test_reorder_kwargs_rejects_unknown_keyword() {
    let keyword = |name: &str, value: &str| KeywordValue {
        name: name.to_string(),
        ty: TypeTag::Int,
        value: value.to_string(),
    };
    let declared = vec![keyword("a", "1"), keyword("b", "2")];

    assert_eq!(
        reorder_kwargs(&declared, vec![keyword("b", "9")]).unwrap(),
        vec![keyword("a", "1"), keyword("b", "9")]
    );
    let error = reorder_kwargs(&declared, vec![keyword("c", "3")]).unwrap_err();
    assert_eq!(error.get_error_name(), "UnsupportedConstruct");
}

fn point_class(methods: Vec<Json>) -> Json {
    let mut block = vec![json!({
        "opcode": "assign",
        "target": { "token": "var", "name": "x", "type": "int" },
        "expr": single(int(0))
    })];
    block.extend(methods);
    json!({ "opcode": "class", "name": "Point", "block": block })
}

fn method(name: &str, body: Vec<Json>) -> Json {
    json!({ "opcode": "func", "name": name, "block": body })
}

fn self_access(steps: Vec<Json>) -> Json {
    self_access_on("self", steps)
}

fn self_access_on(receiver: &str, steps: Vec<Json>) -> Json {
    let mut all = vec![var(receiver)];
    all.extend(steps);
    json!({ "token": "dotAccess", "steps": all })
}

#[test]
fn test_class_lowering() {
    let source = vec![
        point_class(vec![method(
            "norm",
            vec![ret(expr(vec![self_access(vec![var("x")]), int(2)], &["*"]))],
        )]),
        assign("p", single(call("Point", vec![]))),
        assign(
            "n",
            single(json!({
                "token": "dotAccess",
                "steps": [var("p"), call("norm", vec![])]
            })),
        ),
    ];

    assert_eq!(
        python(source),
        [
            "class Point:",
            "    x: int = 0",
            "",
            "    def norm(self) -> int:",
            "        return self.x * 2",
            "",
            "p: Point = Point()",
            "n: int = p.norm()",
            "",
        ]
        .join("\n")
    );
}

#[test]
fn test_methods_see_each_other_regardless_of_order() {
    let source = vec![point_class(vec![
        method(
            "first",
            vec![ret(single(self_access(vec![call("second", vec![single(int(1))])])))],
        ),
        json!({
            "opcode": "func",
            "name": "second",
            "type": "float",
            "args": [{ "name": "n", "type": "int" }],
            "block": [ret(expr(vec![var("n"), int(2)], &["/"]))]
        }),
    ])];
    let mut compiler = compiler();
    compiler.compile(&program(source)).unwrap();

    let class = compiler.classes.get("Point").unwrap();
    assert_eq!(class.method("first").unwrap().return_type, TypeTag::Float);
    assert_eq!(class.attributes[0].name, "x");
    assert!(compiler
        .emitter
        .hoisted()
        .contains(&"def first(self) -> float:".to_string()));
}

#[test]
fn test_class_rejects_duplicates_and_statements() {
    let duplicate = vec![point_class(vec![
        method("norm", vec![]),
        method("norm", vec![]),
    ])];
    assert_eq!(error_name(duplicate), "UnsupportedConstruct");

    let constructors = vec![point_class(vec![
        method("__init__", vec![]),
        method("__init__", vec![]),
    ])];
    assert_eq!(error_name(constructors), "UnsupportedConstruct");

    let statement = vec![point_class(vec![print(single(int(1)))])];
    assert_eq!(error_name(statement), "UnsupportedConstruct");
}

#[test]
fn test_method_reads_attribute_declared_below() {
    let source = vec![json!({
        "opcode": "class",
        "name": "Counter",
        "block": [
            method("get", vec![ret(single(self_access(vec![var("count")])))]),
            {
                "opcode": "assign",
                "target": { "token": "var", "name": "count", "type": "int" },
                "expr": single(int(5))
            }
        ]
    })];

    assert_eq!(
        python(source),
        [
            "class Counter:",
            "    count: int = 5",
            "",
            "    def get(self) -> int:",
            "        return self.count",
            "",
        ]
        .join("\n")
    );
}

#[test]
fn test_method_call_reorders_keywords() {
    let source = vec![
        point_class(vec![json!({
            "opcode": "func",
            "name": "scale",
            "kwargs": [
                { "target": { "name": "a" }, "expr": single(int(1)) },
                { "target": { "name": "b" }, "expr": single(int(2)) }
            ],
            "block": []
        })]),
        assign("p", single(call("Point", vec![]))),
        print(single(self_access_on(
            "p",
            vec![json!({
                "token": "call",
                "name": { "name": "scale" },
                "kwargs": [{ "target": { "name": "b" }, "expr": single(int(5)) }]
            })],
        ))),
    ];
    let output = compile(source).unwrap();

    assert_eq!(
        output.main,
        vec![
            "p: Point = Point()".to_string(),
            "print(p.scale(a=1, b=5))".to_string()
        ]
    );
}

#[test]
fn test_empty_array_attribute_has_unknown_element() {
    let source = vec![json!({
        "opcode": "class",
        "name": "Bag",
        "block": [assign("items", single(json!({ "token": "array" })))]
    })];
    let mut compiler = compiler();
    compiler.compile(&program(source)).unwrap();

    let attribute = &compiler.classes.get("Bag").unwrap().attributes[0];
    assert_eq!(attribute.ty, TypeTag::Array);
    assert_eq!(
        attribute.array.as_ref().map(|shape| shape.element_type.clone()),
        Some(TypeTag::Unknown)
    );
    assert!(compiler
        .emitter
        .hoisted()
        .contains(&"items: list = []".to_string()));
}

#[test]
fn test_array_return_keeps_element_type() {
    let source = vec![
        json!({
            "opcode": "func",
            "name": "make",
            "block": [ret(single(json!({
                "token": "array",
                "elements": [int(1), int(2)]
            })))]
        }),
        assign("ys", single(call("make", vec![]))),
    ];
    let mut compiler = compiler();
    compiler.compile(&program(source)).unwrap();

    let info = compiler.scopes.lookup("ys").unwrap();
    assert_eq!(info.ty, TypeTag::Array);
    assert_eq!(
        info.array.as_ref().map(|shape| shape.element_type.clone()),
        Some(TypeTag::Int)
    );
    assert_eq!(compiler.emitter.hoisted()[0], "def make() -> list:");
    assert_eq!(compiler.emitter.main(), ["ys: list = make()"]);
}

#[test]
fn test_unknown_member_degrades_to_unknown() {
    let source = vec![
        point_class(vec![]),
        assign("p", single(call("Point", vec![]))),
        assign(
            "q",
            single(json!({ "token": "dotAccess", "steps": [var("p"), var("missing")] })),
        ),
    ];
    let mut compiler = compiler();
    compiler.compile(&program(source)).unwrap();

    assert!(!compiler.scopes.contains("q"));
    assert_eq!(compiler.emitter.main()[1], "q = p.missing");
}

#[test]
fn test_emitter_targets() {
    let mut emitter = Emitter::new();
    emitter.emit("main");
    emitter.push_definition();
    emitter.emit("hoisted");

    emitter.push(Target::Suppressed);
    emitter.push_definition();
    emitter.emit("dropped");
    emitter.pop();
    emitter.pop();

    emitter.begin_capture();
    emitter.push_definition();
    emitter.emit("captured");
    emitter.pop();
    let captured = emitter.end_capture();
    emitter.pop();
    emitter.pop();

    assert_eq!(captured, vec!["captured".to_string()]);
    assert_eq!(emitter.current(), Target::Main);
    assert!(!emitter.is_suppressed());
    assert_eq!(emitter.main(), ["main"]);
    assert_eq!(emitter.hoisted(), ["hoisted"]);
}

#[test]
fn test_system_import() {
    let output = compile(vec![json!({ "opcode": "import", "name": "math" })]).unwrap();

    assert!(output.imports.contains("import math"));
    assert_eq!(output.assemble(&PythonBackend::new()), "import math\n\n");
}

#[test]
fn test_local_import_merges_state() {
    let shapes = program(vec![
        json!({
            "opcode": "func",
            "name": "area",
            "args": [{ "name": "r", "type": "float" }],
            "block": [ret(expr(vec![var("r"), var("r")], &["*"]))]
        }),
        json!({ "opcode": "import", "name": "math" }),
    ]);
    let resolver = MemoryResolver::new().with_module("shapes", shapes);
    let source = program(vec![
        json!({ "opcode": "import", "name": "shapes" }),
        assign("a", single(call("area", vec![single(lit("2.0", "float"))]))),
    ]);

    let output = transpile_with(&source, CompilerConfig::default(), Rc::new(resolver)).unwrap();

    assert_eq!(output.hoisted[0], "def area(r: float) -> float:");
    assert!(output.imports.contains("import math"));
    assert_eq!(output.main, vec!["a: float = area(2.0)".to_string()]);
    assert!(!output.module);
}

#[test]
fn test_circular_import_is_detected() {
    let import = |name: &str| json!({ "opcode": "import", "name": name });
    let resolver = MemoryResolver::new()
        .with_module("a", program(vec![import("b")]))
        .with_module("b", program(vec![import("a")]));

    let error = transpile_with(
        &program(vec![import("a")]),
        CompilerConfig::default(),
        Rc::new(resolver),
    )
    .unwrap_err();

    assert_eq!(error.get_error_name(), "CircularImport");
    assert_eq!(error.get_unit(), Some("b"));
    assert_eq!(
        error.get_tip().to_string(),
        "Import chain: main -> a -> b -> a"
    );
}

#[test]
fn test_errors_name_the_imported_unit() {
    let mut resolver = MemoryResolver::new().with_module(
        "broken",
        program(vec![assign("xs", single(json!({ "token": "array" })))]),
    );
    resolver.insert("stdlib", ModuleSource::Standard);
    let resolver: Rc<dyn ModuleResolver> = Rc::new(resolver);

    let error = transpile_with(
        &program(vec![json!({ "opcode": "import", "name": "broken" })]),
        CompilerConfig::default(),
        Rc::clone(&resolver),
    )
    .unwrap_err();
    assert_eq!(error.get_unit(), Some("broken"));
    assert_eq!(error.get_error_name(), "UnknownTypeFallthrough");

    let error = transpile_with(
        &program(vec![json!({ "opcode": "import", "name": "stdlib" })]),
        CompilerConfig::default(),
        resolver,
    )
    .unwrap_err();
    assert_eq!(error.get_unit(), Some("main"));
    assert_eq!(error.get_error_name(), "UnsupportedConstruct");
}

#[test]
fn test_backend_spelling_of_unknown_counts_as_unknown() {
    let compiler = compiler();

    assert!(!compiler.type_known(&TypeTag::Class(PythonBackend::new().unknown_type())));
    assert!(compiler.type_known(&TypeTag::Class("Point".to_string())));
}
