use pretty_assertions::assert_eq;

use questmd::block::{
    Choice, ContradictionBlock, ContradictionData, CustomBlock, NotedBlock, NotedKind, OrderItem,
    ParaBlock, ProofReorderBlock, ProofReorderData, SelectionBlock, SelectionData,
    SingleChoiceBlock, SingleChoiceData, TombstoneBlock,
};
use questmd::{Block, BlockData, BlockRegistry, ErrorKind, MarkdownBlock};

const TWO_PARTS: &str = "Proof\n\n#### Part 1\nOne\n\n#### Part 2\nTwo\n\n#### Question Order\n";

fn block(tag: &str, id: &str, body: &str) -> MarkdownBlock {
    MarkdownBlock::parse(tag, id, body).expect("lex failed")
}

fn convert(tag: &str, id: &str, body: &str) -> Block {
    BlockRegistry::with_builtins()
        .convert(&block(tag, id, body))
        .unwrap_or_else(|err| panic!("conversion failed: {}", err))
}

fn convert_err(tag: &str, id: &str, body: &str) -> String {
    match BlockRegistry::with_builtins().convert(&block(tag, id, body)) {
        Ok(block) => panic!("expected an error, got {:?}", block),
        Err(err) => {
            assert_eq!(err.kind, ErrorKind::Validation);
            err.message
        }
    }
}

fn abc_choices() -> Vec<Choice> {
    vec![
        Choice::new("a", "First choice"),
        Choice::new("b", "Second choice"),
        Choice::new("c", "Third choice"),
    ]
}

// ---------------------------------------------------------------------------
// Para
// ---------------------------------------------------------------------------

#[test]
fn para_from_leading_content() {
    let Block::Para(para) = convert("para", "test-id", "Test content") else {
        panic!("expected a para block");
    };
    assert_eq!(para.id, "test-id");
    assert_eq!(para.content, "Test content");
    assert_eq!(para.text(), "Test content");
    assert_eq!(para.block_type(), "PARA");
}

#[test]
fn para_content_property_wins() {
    let Block::Para(para) = convert(
        "para",
        "p",
        "This is the welcome paragraph.\n\n#### Content\nWelcome to the quest!",
    ) else {
        panic!("expected a para block");
    };
    assert_eq!(para.content, "Welcome to the quest!");
}

#[test]
fn para_falls_back_to_leading_content_when_property_is_empty() {
    let body = "Leading text.\n\n#### Content\n\n#### Headline\nTitle";
    let Block::Para(para) = convert("para", "p", body) else {
        panic!("expected a para block");
    };
    assert_eq!(para.content, "Leading text.");
    assert_eq!(para.headline, "Title");
}

#[test]
fn empty_para_is_rejected() {
    assert_eq!(
        convert_err("para", "empty-para", ""),
        "Content cannot be empty for block ID: empty-para"
    );
    assert!(ParaBlock::new("p", "   ").validate().is_err());
}

// ---------------------------------------------------------------------------
// Noted
// ---------------------------------------------------------------------------

#[test]
fn every_noted_kind_converts() {
    for kind in NotedKind::ALL {
        let md = block(kind.tag(), "n-1", "Statement body.").with_name("Named");
        let converted = BlockRegistry::with_builtins().convert(&md).expect("noted block");
        assert_eq!(converted.block_type(), kind.as_str());
        assert_eq!(converted.name(), Some("Named"));
        assert_eq!(converted.content(), "Statement body.");
    }
}

#[test]
fn noted_uses_leading_content_only() {
    let body = "Every bounded sequence has a convergent subsequence.\n\n#### Content\nignored";
    let Block::Noted(noted) = convert("theorem", "t", body) else {
        panic!("expected a noted block");
    };
    assert_eq!(noted.kind, NotedKind::Theorem);
    assert_eq!(noted.content, "Every bounded sequence has a convergent subsequence.");
}

#[test]
fn noted_text() {
    let noted =
        NotedBlock::new("d-1", NotedKind::Definition, "A set is a collection.").with_name("Set");
    assert_eq!(noted.text(), "Definition: Set\nA set is a collection.");
}

#[test]
fn empty_noted_names_its_type() {
    assert_eq!(
        convert_err("lemma", "l-1", "#### Content\nonly a property"),
        "Content cannot be empty for block ID: l-1 (Type: LEMMA)"
    );
}

// ---------------------------------------------------------------------------
// Single choice
// ---------------------------------------------------------------------------

#[test]
fn single_choice_from_markdown() {
    let Block::SingleChoice(single) = convert(
        "single_choice",
        "sc-1",
        "What is 1 + 1?

#### Choices
a: 1
b: 2

#### Answer
b

#### Explanation
Basic arithmetic.",
    ) else {
        panic!("expected a single choice block");
    };
    assert_eq!(single.content, "What is 1 + 1?");
    assert_eq!(
        single.question_data,
        SingleChoiceData {
            choices: vec![Choice::new("a", "1"), Choice::new("b", "2")],
            answer: "b".to_string(),
            explanation: "Basic arithmetic.".to_string(),
        }
    );
}

#[test]
fn single_choice_validation_order() {
    let data = |choices: Vec<Choice>, answer: &str, explanation: &str| SingleChoiceData {
        choices,
        answer: answer.to_string(),
        explanation: explanation.to_string(),
    };
    let message = |data| SingleChoiceBlock::new("q", "Q", data).validate().unwrap_err().message;

    assert_eq!(message(data(vec![], "a", "e")), "Choices cannot be empty for block ID: q");
    assert_eq!(message(data(abc_choices(), "a", " ")), "Explanation is required for block ID: q");
    assert_eq!(message(data(abc_choices(), "", "e")), "Answer is required for block ID: q");
    assert_eq!(
        message(data(abc_choices(), "z", "e")),
        "Answer key \"z\" does not exist in choices (a, b, c) for block ID: q"
    );
}

#[test]
fn single_choice_text() {
    let single = SingleChoiceBlock::new(
        "q",
        "Pick one",
        SingleChoiceData {
            choices: abc_choices(),
            answer: "b".to_string(),
            explanation: "Because.".to_string(),
        },
    );
    assert_eq!(
        single.text(),
        "Pick one\n\nchoices:\na: First choice\nb: Second choice\nc: Third choice\n\nanswer:\nb\n\nexplanation:\nBecause."
    );
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

#[test]
fn selection_from_markdown() {
    let Block::Selection(selection) = convert(
        "selection",
        "sel-1",
        "This is the main content.
#### Choices
a: First choice
b: Second choice
c: Third choice
d: Fourth choice
#### Answer
a, c, d
#### Explanation
This is the explanation.",
    ) else {
        panic!("expected a selection block");
    };
    assert_eq!(selection.content, "This is the main content.");
    assert_eq!(selection.question_data.choices.len(), 4);
    assert_eq!(selection.question_data.choices[3], Choice::new("d", "Fourth choice"));
    assert_eq!(selection.question_data.answer, vec!["a", "c", "d"]);
    assert_eq!(selection.question_data.explanation, "This is the explanation.");
}

#[test]
fn selection_rejects_unknown_answer_key() {
    assert_eq!(
        convert_err(
            "selection",
            "test-id",
            "Content
#### Choices
a: First choice
b: Second choice
c: Third choice
d: Fourth choice
#### Answer
a, e
#### Explanation
Explanation",
        ),
        "Answer key \"e\" does not exist in choices (a, b, c, d) for block ID: test-id"
    );
}

#[test]
fn selection_requires_an_answer() {
    assert_eq!(
        convert_err(
            "selection",
            "test-id",
            "Content\n#### Choices\na: A\n#### Answer\n\n#### Explanation\nWhy",
        ),
        "Answer must contain at least 1 key for block ID: test-id"
    );
}

#[test]
fn selection_requires_choices_and_explanation() {
    assert_eq!(
        convert_err("selection", "s", "Content\n#### Answer\na\n#### Explanation\nWhy"),
        "Choices cannot be empty for block ID: s"
    );
    assert_eq!(
        convert_err("selection", "s", "Content\n#### Choices\na: A\n#### Answer\na"),
        "Explanation is required for block ID: s"
    );
}

#[test]
fn selection_drops_repeated_answer_keys() {
    let Block::Selection(selection) = convert(
        "selection",
        "s",
        "Q\n#### Choices\na: A\nb: B\nc: C\n#### Answer\na, b, a, c, b\n#### Explanation\nE",
    ) else {
        panic!("expected a selection block");
    };
    assert_eq!(selection.question_data.answer, vec!["a", "b", "c"]);
}

#[test]
fn selection_text() {
    let selection = SelectionBlock::new(
        "test-id",
        "Main content",
        SelectionData {
            choices: abc_choices(),
            answer: vec!["a".to_string(), "c".to_string()],
            explanation: "Test explanation".to_string(),
        },
    );
    assert_eq!(
        selection.text(),
        "Main content\n\nchoices:\na: First choice\nb: Second choice\nc: Third choice\n\nanswer:\na, c\n\nexplanation:\nTest explanation"
    );
}

#[test]
fn selection_text_with_empty_content() {
    let selection = SelectionBlock::new(
        "test-id",
        "",
        SelectionData {
            choices: vec![Choice::new("a", "First choice")],
            answer: vec!["a".to_string()],
            explanation: "Test explanation".to_string(),
        },
    );
    assert_eq!(
        selection.text(),
        "\n\nchoices:\na: First choice\n\nanswer:\na\n\nexplanation:\nTest explanation"
    );
}

// ---------------------------------------------------------------------------
// Proof reorder
// ---------------------------------------------------------------------------

#[test]
fn proof_reorder_from_markdown() {
    let Block::ProofReorder(reorder) = convert(
        "proof_reorder",
        "pr-1",
        "Main content

#### Part 1
First part

#### Part 2
Second part

#### Part 3
Third part

#### Question Order
3,1,2",
    ) else {
        panic!("expected a proof reorder block");
    };
    assert_eq!(reorder.content, "Main content");
    assert_eq!(
        reorder.question_data,
        ProofReorderData {
            order_items: vec![
                OrderItem::new("1", "First part"),
                OrderItem::new("2", "Second part"),
                OrderItem::new("3", "Third part"),
            ],
            question_order: "3,1,2".to_string(),
        }
    );
}

#[test]
fn proof_reorder_validation() {
    assert_eq!(
        convert_err("proof_reorder", "pr", "Proof\n\n#### Question Order\n1"),
        "Parts cannot be empty for block ID: pr"
    );
    assert_eq!(
        convert_err("proof_reorder", "pr", "Proof\n\n#### Part 1\nOne"),
        "Question order is required for block ID: pr"
    );
    assert_eq!(
        convert_err("proof_reorder", "pr", &format!("{}2", TWO_PARTS)),
        "Number of parts (2) does not match the length of question order (1) for block ID: pr"
    );
    assert_eq!(
        convert_err("proof_reorder", "pr", &format!("{}2, 5", TWO_PARTS)),
        "Question order entry \"5\" does not match any part (1, 2) for block ID: pr"
    );
}

#[test]
fn proof_reorder_text() {
    let reorder = ProofReorderBlock::new(
        "test-id",
        "Main content",
        ProofReorderData {
            order_items: vec![
                OrderItem::new("1", "First part"),
                OrderItem::new("2", "Second part"),
            ],
            question_order: "2,1".to_string(),
        },
    );
    assert_eq!(
        reorder.text(),
        "Proof:\n\nMain content\n\npart-1:\nFirst part\n\npart-2:\nSecond part\n\n"
    );

    let empty = ProofReorderBlock::new(
        "test-id",
        "",
        ProofReorderData {
            order_items: vec![OrderItem::new("1", "First part")],
            question_order: "1".to_string(),
        },
    );
    assert_eq!(empty.text(), "Proof:\n\n\n\npart-1:\nFirst part\n\n");
}

// ---------------------------------------------------------------------------
// Contradiction
// ---------------------------------------------------------------------------

#[test]
fn contradiction_from_markdown() {
    let Block::Contradiction(contradiction) = convert(
        "contradiction",
        "c-1",
        "Which two statements contradict each other?

#### Choices
a: x > 1
b: x is odd
c: x < 0

#### Answer
a, c

#### Explanation
x cannot be both greater than 1 and negative.",
    ) else {
        panic!("expected a contradiction block");
    };
    assert_eq!(contradiction.question_data.answer, vec!["a", "c"]);
    assert_eq!(contradiction.block_type(), "CONTRADICTION");
}

#[test]
fn contradiction_needs_exactly_two_keys() {
    let data = |answer: &[&str]| ContradictionData {
        choices: abc_choices(),
        answer: answer.iter().map(|k| k.to_string()).collect(),
        explanation: "E".to_string(),
    };
    let message = |answer: &[&str]| {
        ContradictionBlock::new("c", "Q", data(answer))
            .validate()
            .unwrap_err()
            .message
    };
    assert_eq!(message(&["a"]), "Answer must contain exactly 2 keys, found 1 for block ID: c");
    assert_eq!(
        message(&["a", "b", "c"]),
        "Answer must contain exactly 2 keys, found 3 for block ID: c"
    );
    assert_eq!(
        message(&["a", "q"]),
        "Answer key \"q\" does not exist in choices (a, b, c) for block ID: c"
    );
    assert!(ContradictionBlock::new("c", "Q", data(&["a", "b"])).validate().is_ok());
}

// ---------------------------------------------------------------------------
// Tombstone and custom
// ---------------------------------------------------------------------------

#[test]
fn tombstone_ignores_its_body() {
    let Block::Tombstone(tombstone) = convert("tombstone", "end-1", "anything") else {
        panic!("expected a tombstone block");
    };
    assert_eq!(tombstone.content, "");
    assert_eq!(tombstone.text(), "--- Proof End ---");
    assert_eq!(
        TombstoneBlock::new("").validate().unwrap_err().message,
        "ID is required"
    );
}

#[test]
fn custom_block_text_falls_back_to_content() {
    let plain = CustomBlock::new("x", "custom", "Body");
    assert_eq!(plain.text(), "Body");
    assert_eq!(plain.with_text("Shown").text(), "Shown");
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

#[test]
fn blocks_serialize_with_type_discriminant() {
    let selection = convert(
        "selection",
        "sel",
        "Q\n#### Choices\na: A\nb: B\n#### Answer\nb\n#### Explanation\nE",
    );
    let json = serde_json::to_value(&selection).unwrap();
    assert_eq!(json["type"], "SELECTION");
    assert_eq!(json["id"], "sel");
    assert_eq!(json["questionData"]["answer"], serde_json::json!(["b"]));
    assert_eq!(json["questionData"]["choices"][0], serde_json::json!({"key": "a", "content": "A"}));
    assert!(json["updatedAt"].is_string());

    let noted = convert("fact", "f", "Water is wet.");
    let json = serde_json::to_value(&noted).unwrap();
    assert_eq!(json["type"], "FACT");
    assert!(json.get("kind").is_none());

    let reorder = convert("proof_reorder", "pr", "P\n\n#### Part 1\nOne\n\n#### Question Order\n1");
    let json = serde_json::to_value(&reorder).unwrap();
    assert_eq!(json["questionData"]["questionOrder"], "1");
    assert_eq!(json["questionData"]["orderItems"][0]["id"], "1");
}
