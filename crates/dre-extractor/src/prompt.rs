//! Relation extraction prompt
//!
//! Renders a dialogue and the allowed relation labels into a single
//! instruction asking for strict-JSON triples.

/// Separator placed between utterances
pub const UTTERANCE_SEPARATOR: &str = "\n";

/// Build the relation extraction prompt for one dialogue.
///
/// Labels are embedded verbatim as a JSON array, in the given order.
pub fn build_relation_prompt(dialogue: &[String], relation_types: &[String]) -> String {
    let conversation = dialogue.join(UTTERANCE_SEPARATOR);
    let labels = serde_json::to_string(relation_types).unwrap_or_default();

    format!(
        r#"Extract the relations between people, places and times mentioned in the following dialogue. Reply in strict JSON using this format:
{{
  "relations": [
    {{"head": "entity 1", "tail": "entity 2", "relation": "relation type"}},
    ...
  ]
}}

Dialogue:
{conversation}

Allowed relation types (use these labels exactly):
{labels}

Requirements:
1. Entities must appear verbatim in the dialogue text
2. Each relation must be exactly one of the allowed relation types
3. Do not add any explanatory text
4. Ignore unrelated annotation fields such as rid, x_type and y_type"#
    )
}
