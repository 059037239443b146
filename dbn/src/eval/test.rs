use expect_test::{expect, Expect};

use crate::ast::{
    block, bracket, command, define, number, op, question, repeat, set, word, Operator, Question,
    Stmt,
};
use crate::error::{ErrorKind, Phase};
use crate::state::State;
use crate::Config;

fn run(program: Stmt) -> crate::Result<State> {
    super::run(&program, &Config::default())
}

fn window(state: &State, w: i64, h: i64) -> String {
    (0..h)
        .rev()
        .map(|y| {
            (0..w)
                .map(|x| match state.canvas().query_pixel(x, y) {
                    0 => '.',
                    100 => '#',
                    _ => '+',
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn check(program: Stmt, w: i64, h: i64, expect: Expect) {
    let state = run(program).unwrap();
    expect.assert_eq(&window(&state, w, h));
}

fn err(program: Stmt) -> crate::Error {
    run(program).unwrap_err()
}

#[test]
fn repeat_row() {
    check(
        repeat(
            word("X"),
            number(0),
            number(5),
            set(bracket(word("X"), number(0)), number(100)).with_line(2),
        )
        .with_line(1),
        8,
        2,
        expect![[r#"
            ........
            ######.."#]],
    );
}

#[test]
fn repeat_reversed_bounds() {
    let row = |start: i64, end: i64| {
        let program = repeat(
            word("X"),
            number(start),
            number(end),
            set(bracket(word("X"), number(0)), number(100)).with_line(2),
        )
        .with_line(1);
        run(program).unwrap().into_canvas()
    };
    assert_eq!(row(0, 5), row(5, 0));
}

#[test]
fn repeat_runs_low_to_high() {
    let program = block([
        set(word("Last"), number(-1)).with_line(1),
        repeat(
            word("I"),
            number(3),
            number(1),
            set(word("Last"), word("I")).with_line(3),
        )
        .with_line(2),
    ]);
    let state = run(program).unwrap();
    assert_eq!(state.lookup_variable("Last"), 3);
    assert_eq!(state.lookup_variable("I"), 3);
}

#[test]
fn repeat_single_value() {
    let program = repeat(
        word("I"),
        number(4),
        number(4),
        set(bracket(word("I"), word("I")), number(100)).with_line(2),
    )
    .with_line(1);
    check(
        program,
        6,
        6,
        expect![[r#"
            ......
            ....#.
            ......
            ......
            ......
            ......"#]],
    );
}

#[test]
fn paper_pen_line() {
    let program = block([
        command("Paper", [number(0)]).with_line(1),
        command("Pen", [number(100)]).with_line(2),
        command("Line", [number(0), number(0), number(100), number(100)]).with_line(3),
    ]);
    let state = run(program).unwrap();
    let canvas = state.canvas();
    for x in 0..=100 {
        for y in 0..=100 {
            let expected = if x == y { 100 } else { 0 };
            assert_eq!(canvas.query_pixel(x, y), expected, "({x}, {y})");
        }
    }
}

#[test]
fn paper_and_pen_clip() {
    let program = block([
        command("Paper", [number(150)]).with_line(1),
        command("Pen", [number(-20)]).with_line(2),
        command("Line", [number(0), number(0), number(2), number(0)]).with_line(3),
    ]);
    check(
        program,
        4,
        1,
        expect![[r#"
            ...#"#]],
    );
}

#[test]
fn pen_does_not_touch_canvas() {
    let state = run(command("Pen", [number(20)]).with_line(1)).unwrap();
    assert_eq!(state.pen(), 20);
    assert_eq!(state.canvas(), State::default().canvas());
}

#[test]
fn questions_branch() {
    let mark = |q: Question, l: i64, r: i64, x: i64| {
        question(
            q,
            number(l),
            number(r),
            set(bracket(number(x), number(0)), number(100)).with_line(9),
        )
        .with_line(8)
    };
    let program = block([
        mark(Question::Same, 1, 1, 0),
        mark(Question::Same, 1, 2, 1),
        mark(Question::NotSame, 1, 2, 2),
        mark(Question::NotSame, 2, 2, 3),
        mark(Question::Smaller, 1, 2, 4),
        mark(Question::Smaller, 2, 2, 5),
        mark(Question::NotSmaller, 2, 2, 6),
        mark(Question::NotSmaller, 1, 2, 7),
    ]);
    check(
        program,
        8,
        1,
        expect![[r##"
            #.#.#.#."##]],
    );
}

#[test]
fn arithmetic_and_reads() {
    let program = block([
        set(bracket(number(1), number(1)), number(60)).with_line(1),
        set(word("A"), bracket(number(1), number(1))).with_line(2),
        set(word("B"), op(Operator::Div, word("A"), number(8))).with_line(3),
        set(
            word("C"),
            op(
                Operator::Sub,
                op(Operator::Mul, word("B"), number(3)),
                number(1),
            ),
        )
        .with_line(4),
        set(word("D"), bracket(number(-5), number(300))).with_line(5),
    ]);
    let state = run(program).unwrap();
    assert_eq!(state.lookup_variable("A"), 60);
    assert_eq!(state.lookup_variable("B"), 8);
    assert_eq!(state.lookup_variable("C"), 23);
    assert_eq!(state.lookup_variable("D"), 0);
}

#[test]
fn unbound_word_is_zero() {
    let program = set(word("A"), op(Operator::Add, word("Nope"), number(2))).with_line(1);
    let state = run(program).unwrap();
    assert_eq!(state.lookup_variable("A"), 2);
}

#[test]
fn user_command() {
    let square = define(
        word("Square"),
        [word("X"), word("Y"), word("S")],
        block([
            command(
                "Line",
                [
                    word("X"),
                    word("Y"),
                    op(Operator::Add, word("X"), word("S")),
                    word("Y"),
                ],
            )
            .with_line(2),
            command(
                "Line",
                [
                    word("X"),
                    op(Operator::Add, word("Y"), word("S")),
                    op(Operator::Add, word("X"), word("S")),
                    op(Operator::Add, word("Y"), word("S")),
                ],
            )
            .with_line(3),
        ]),
    )
    .with_line(1);
    let program = block([
        square,
        command("Square", [number(1), number(1), number(3)]).with_line(5),
    ]);
    let state = run(program).unwrap();
    assert_eq!(state.lookup_variable("X"), 0);
    assert_eq!(state.depth(), 0);
    let proc = state.lookup_command("Square").unwrap();
    assert_eq!(proc.formals, ["X", "Y", "S"]);
    assert_eq!(proc.line_no, crate::LineNo::new(1));
    expect![[r#"
        ......
        .####.
        ......
        ......
        .####.
        ......"#]]
    .assert_eq(&window(&state, 6, 6));
}

#[test]
fn callee_sees_caller_scope() {
    let program = block([
        define(
            word("Mark"),
            [],
            set(bracket(word("Where"), number(0)), number(100)).with_line(2),
        )
        .with_line(1),
        set(word("Where"), number(3)).with_line(3),
        command("Mark", []).with_line(4),
    ]);
    check(
        program,
        5,
        1,
        expect![[r#"
            ...#."#]],
    );
}

#[test]
fn formals_shadow_and_unwind() {
    let program = block([
        define(
            word("Bump"),
            [word("N")],
            set(word("N"), op(Operator::Add, word("N"), number(1))).with_line(2),
        )
        .with_line(1),
        set(word("N"), number(10)).with_line(3),
        command("Bump", [number(1)]).with_line(4),
    ]);
    let state = run(program).unwrap();
    assert_eq!(state.lookup_variable("N"), 10);
}

#[test]
fn redefine_builtin() {
    let program = block([
        define(
            word("Pen"),
            [word("V")],
            set(word("Called"), word("V")).with_line(2),
        )
        .with_line(1),
        command("Pen", [number(5)]).with_line(3),
    ]);
    let state = run(program).unwrap();
    assert_eq!(state.pen(), 100);
    assert_eq!(state.lookup_variable("Called"), 0);
}

#[test]
fn undefined_command() {
    let e = err(block([
        set(word("A"), number(1)).with_line(1),
        command("Foo", [number(1), number(2)]).with_line(2),
    ]));
    assert_eq!(e.kind, ErrorKind::UndefinedCommand { name: "Foo".into() });
    assert_eq!(e.line_no, Some(2));
    assert!(e.is_user_error());
    expect![[r#"line 2: command Foo is not defined"#]].assert_eq(&e.to_string());
}

#[test]
fn arity_mismatch() {
    let e = err(block([
        define(
            word("Sq"),
            [word("X")],
            set(word("Y"), word("X")).with_line(2),
        )
        .with_line(1),
        command("Sq", [number(1), number(2)]).with_line(3),
    ]));
    assert_eq!(
        e.kind,
        ErrorKind::ArityMismatch {
            name: "Sq".into(),
            expected: 1,
            found: 2
        }
    );
    assert_eq!(e.line_no, Some(3));
}

#[test]
fn repeated_formal() {
    let e = err(block([
        define(
            word("F"),
            [word("A"), word("B"), word("A")],
            set(word("Y"), word("A")).with_line(2),
        )
        .with_line(1),
        command("F", [number(1), number(2), number(3)]).with_line(3),
    ]));
    assert_eq!(e.kind, ErrorKind::DuplicateFormal { name: "A".into() });
    assert_eq!(e.line_no, Some(1));
    assert!(e.is_user_error());
}

fn countdown(n: i64) -> Stmt {
    block([
        define(
            word("Down"),
            [word("N")],
            question(
                Question::Smaller,
                number(0),
                word("N"),
                command("Down", [op(Operator::Sub, word("N"), number(1))]).with_line(3),
            )
            .with_line(2),
        )
        .with_line(1),
        command("Down", [number(n)]).with_line(5),
    ])
}

#[test]
fn recursion_within_limit() {
    let state = run(countdown(49)).unwrap();
    assert_eq!(state.depth(), 0);
}

#[test]
fn recursion_limit() {
    let e = err(countdown(50));
    assert_eq!(e.kind, ErrorKind::RecursionLimitExceeded { limit: 50 });
    assert_eq!(e.line_no, Some(3));
}

#[test]
fn unconditional_recursion() {
    let e = err(block([
        define(word("Loop"), [], command("Loop", []).with_line(2)).with_line(1),
        command("Loop", []).with_line(3),
    ]));
    assert_eq!(e.kind, ErrorKind::RecursionLimitExceeded { limit: 50 });
}

#[test]
fn custom_recursion_limit() {
    let config = Config {
        recursion_limit: 5,
        ..Config::default()
    };
    assert!(super::run(&countdown(4), &config).is_ok());
    let e = super::run(&countdown(5), &config).unwrap_err();
    assert_eq!(e.kind, ErrorKind::RecursionLimitExceeded { limit: 5 });
}

#[test]
fn division_by_zero() {
    let e = err(set(word("A"), op(Operator::Div, number(1), number(0))).with_line(7));
    assert_eq!(e.kind, ErrorKind::DivisionByZero);
    assert_eq!(e.line_no, Some(7));
}

#[test]
fn bad_number() {
    let e = err(set(word("A"), number("1x")).with_line(1));
    assert_eq!(e.kind, ErrorKind::InvalidNumber { text: "1x".into() });
}

#[test]
fn number_is_not_an_lvalue() {
    let e = err(set(number(3), number(1)).with_line(4));
    assert_eq!(
        e.kind,
        ErrorKind::UnknownNodeType {
            node: "number",
            phase: Phase::EvaluateLazy
        }
    );
    assert!(!e.is_user_error());
}

#[test]
fn repeat_needs_variable() {
    let e = err(repeat(
        bracket(number(0), number(0)),
        number(0),
        number(1),
        block([]),
    )
    .with_line(1));
    assert_eq!(e.kind, ErrorKind::InvalidLValue { found: "dot" });
}

#[test]
fn missing_line_number() {
    let e = err(set(word("A"), number(1)));
    assert_eq!(e.kind, ErrorKind::InvalidLineNumber);
    assert_eq!(e.line_no, None);
}

#[test]
fn input_state_is_untouched() {
    let start = State::default();
    let program = block([
        set(bracket(number(0), number(0)), number(100)).with_line(1),
        set(word("A"), number(4)).with_line(2),
    ]);
    let end = super::apply(&program, start.clone()).unwrap();
    assert_eq!(start.canvas().query_pixel(0, 0), 0);
    assert_eq!(start.lookup_variable("A"), 0);
    assert_eq!(end.canvas().query_pixel(0, 0), 100);
    assert_eq!(end.line_no(), crate::LineNo::new(2));
}
