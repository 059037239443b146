use expect_test::{expect, Expect};

use crate::instruction::{Instruction, Interner};

fn check(src: &str, expect: Expect) {
    let output = match super::decode(src) {
        Ok(code) => code.encode(),
        Err(errors) => errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n"),
    };
    expect.assert_eq(&output);
}

#[test]
fn empty() {
    check("", expect![[""]]);
    check("\n\n  \n; nothing here\n", expect![[""]]);
}

#[test]
fn indexed_listing() {
    check(
        "; one dot
0 SET_LINE_NO 1
1 LOAD_INTEGER 10
2 LOAD_INTEGER 20
3 LOAD_INTEGER 100   ; color
4 SET_DOT _

5 END
",
        expect![[r#"
            0 SET_LINE_NO 1
            1 LOAD_INTEGER 10
            2 LOAD_INTEGER 20
            3 LOAD_INTEGER 100
            4 SET_DOT
            5 END"#]],
    );
}

#[test]
fn every_opcode() {
    check(
        "SET_LINE_NO 3
LOAD A
STORE B
LOAD_INTEGER -4
LOAD_STRING Line
SET_DOT
GET_DOT
BINARY_ADD
BINARY_SUB
BINARY_MUL
BINARY_DIV
COMPARE_SAME
COMPARE_SMALLER
DUP_TOPX 2
POP_TOPX 1
ROT_TWO
JUMP 0
POP_JUMP_IF_FALSE 1
POP_JUMP_IF_TRUE 2
REPEAT_STEP
DEFINE_COMMAND 3
COMMAND 4
RETURN
LOAD_CODE lib.dbn
END",
        expect![[r#"
            0 SET_LINE_NO 3
            1 LOAD A
            2 STORE B
            3 LOAD_INTEGER -4
            4 LOAD_STRING Line
            5 SET_DOT
            6 GET_DOT
            7 BINARY_ADD
            8 BINARY_SUB
            9 BINARY_MUL
            10 BINARY_DIV
            11 COMPARE_SAME
            12 COMPARE_SMALLER
            13 DUP_TOPX 2
            14 POP_TOPX 1
            15 ROT_TWO
            16 JUMP 0
            17 POP_JUMP_IF_FALSE 1
            18 POP_JUMP_IF_TRUE 2
            19 REPEAT_STEP
            20 DEFINE_COMMAND 3
            21 COMMAND 4
            22 RETURN
            23 LOAD_CODE lib.dbn
            24 END"#]],
    );
}

#[test]
fn labels() {
    check(
        "LOAD_INTEGER 3
STORE N
loop:
LOAD N
POP_JUMP_IF_FALSE done
LOAD N
LOAD_INTEGER 1
BINARY_SUB
STORE N
JUMP loop
done:
LOAD_INTEGER done
END",
        expect![[r#"
            0 LOAD_INTEGER 3
            1 STORE N
            2 LOAD N
            3 POP_JUMP_IF_FALSE 9
            4 LOAD N
            5 LOAD_INTEGER 1
            6 BINARY_SUB
            7 STORE N
            8 JUMP 2
            9 LOAD_INTEGER 9
            10 END"#]],
    );
}

#[test]
fn unknown_opcode_is_kept() {
    check(
        "FROB 3\nEND",
        expect![[r#"
            0 FROB
            1 END"#]],
    );
}

#[test]
fn errors_per_line() {
    check(
        "LOAD
END 3
JUMP 1 2
SET_LINE_NO x
JUMP nowhere
a:
a:
DUP_TOPX -1
END",
        expect![[r#"
            line 1: LOAD needs an argument
            line 2: END takes no argument
            line 3: expected at most an opcode and one argument
            line 4: "x" is not an integer
            line 5: label nowhere is not defined
            line 7: label a is already defined
            line 8: "-1" is not a count"#]],
    );
}

#[test]
fn based_unit() {
    let mut si = Interner::default();
    let code = super::decode_at("top:\nLOAD_INTEGER top\nJUMP 1\nJUMP top", &mut si, 10).unwrap();
    assert_eq!(
        code,
        [
            Instruction::LoadInteger(10),
            Instruction::Jump(11),
            Instruction::Jump(10),
        ]
    );
}
