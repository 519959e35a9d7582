use crate::error::{AirulesError, Result};
use crate::remote::{RuleSet, short_name};
use inquire::Select;
use std::io::IsTerminal;

pub fn is_interactive() -> bool {
    std::io::stdin().is_terminal()
}

/// One line per rule set: `<id>. <short name> (<full name>)`.
pub fn rule_set_labels(rule_sets: &[RuleSet]) -> Vec<String> {
    rule_sets
        .iter()
        .enumerate()
        .map(|(index, rule_set)| {
            let short = short_name(&rule_set.name);
            if short == rule_set.name {
                format!("{}. {}", index + 1, rule_set.name)
            } else {
                format!("{}. {} ({})", index + 1, short, rule_set.name)
            }
        })
        .collect()
}

/// Asks the user to choose one of `rule_sets`. Fails when stdin is not a terminal.
pub fn select_rule_set(prompt: &str, rule_sets: Vec<RuleSet>) -> Result<RuleSet> {
    if !is_interactive() {
        return Err(AirulesError::Custom(
            t!("interactive.not_a_terminal").to_string(),
        ));
    }
    if rule_sets.is_empty() {
        return Err(AirulesError::Custom(
            t!("interactive.nothing_to_pick").to_string(),
        ));
    }

    let labels = rule_set_labels(&rule_sets);
    let selection = Select::new(prompt, labels.clone())
        .with_page_size(15)
        .prompt()?;
    let index = labels
        .iter()
        .position(|label| label == &selection)
        .ok_or_else(|| AirulesError::RuleSetNotFound { name: selection })?;

    let Some(picked) = rule_sets.into_iter().nth(index) else {
        let message = t!("interactive.nothing_to_pick").to_string();
        return Err(AirulesError::Custom(message));
    };
    Ok(picked)
}
