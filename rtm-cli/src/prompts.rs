use anyhow::Result;
use inquire::{Confirm, Select};
use std::fmt;

use rtm_core::{ImportSession, TargetField};

/// One line of the mapping menu
enum MenuChoice {
    Column {
        header: String,
        field: Option<TargetField>,
        conflicted: bool,
    },
    TogglePartial(bool),
    Done,
}

impl fmt::Display for MenuChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuChoice::Column {
                header,
                field,
                conflicted,
            } => {
                let target = field.map(|t| t.label()).unwrap_or("(ignored)");
                let marker = if *conflicted { "  [conflict]" } else { "" };
                write!(f, "{} -> {}{}", header, target, marker)
            }
            MenuChoice::TogglePartial(on) => write!(
                f,
                "Partial mapping: {} (toggle)",
                if *on { "on" } else { "off" }
            ),
            MenuChoice::Done => write!(f, "Done"),
        }
    }
}

/// A target offered for one column
struct FieldChoice(Option<TargetField>);

impl fmt::Display for FieldChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(field) => write!(f, "{} ({}, {})", field.label(), field.id(), field.tier()),
            None => write!(f, "(ignore this column)"),
        }
    }
}

/// Let the user adjust the column mapping until they choose Done
pub fn edit_mapping(mut session: ImportSession) -> Result<ImportSession> {
    loop {
        let mapping = session.mapping();
        let mut choices: Vec<MenuChoice> = mapping
            .entries()
            .iter()
            .map(|e| MenuChoice::Column {
                header: e.header.clone(),
                field: e.field,
                conflicted: mapping.is_conflicted(&e.header),
            })
            .collect();
        choices.push(MenuChoice::TogglePartial(session.allow_partial()));
        choices.push(MenuChoice::Done);

        let missing = mapping.unmapped_core();
        let prompt = if missing.is_empty() {
            "Column mapping:".to_string()
        } else {
            let ids: Vec<&str> = missing.iter().map(|f| f.id()).collect();
            format!("Column mapping (unmapped required: {}):", ids.join(", "))
        };

        match Select::new(&prompt, choices).with_page_size(15).prompt()? {
            MenuChoice::Column { header, field, .. } => {
                let mut options = vec![FieldChoice(None)];
                options.extend(
                    session
                        .mapping()
                        .available_fields(&header)
                        .into_iter()
                        .map(|f| FieldChoice(Some(f))),
                );
                let start = options
                    .iter()
                    .position(|c| c.0 == field)
                    .unwrap_or(0);

                let picked = Select::new(&format!("Map '{}' to:", header), options)
                    .with_starting_cursor(start)
                    .with_page_size(15)
                    .prompt()?;
                session = session.set_mapping(&header, picked.0)?;
            }
            MenuChoice::TogglePartial(on) => {
                session = session.set_allow_partial(!on)?;
            }
            MenuChoice::Done => return Ok(session),
        }
    }
}

/// Ask before sending rows to the service
pub fn confirm_submit(rows: usize, needs_review: bool) -> Result<bool> {
    let message = if needs_review {
        format!("Submit {} requirement(s), flagged for review?", rows)
    } else {
        format!("Submit {} requirement(s)?", rows)
    };
    Ok(Confirm::new(&message).with_default(false).prompt()?)
}
