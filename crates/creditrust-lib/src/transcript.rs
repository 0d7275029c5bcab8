//! Flat, append-only record of a chat session.
//!
//! The answer pipeline never reads this; it exists for the chat front end to
//! display and optionally save.

use std::io::{BufRead, Write};

use anyhow::Context;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Assistant => f.write_str("assistant"),
        }
    }
}

/// One message in the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub at: Timestamp,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) -> &Turn {
        self.turns.push(Turn {
            role,
            content: content.into(),
            at: Timestamp::now(),
        });
        &self.turns[self.turns.len() - 1]
    }

    pub fn push_user(&mut self, content: impl Into<String>) -> &Turn {
        self.push(Role::User, content)
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) -> &Turn {
        self.push(Role::Assistant, content)
    }

    /// Forget every turn.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Write one JSON object per turn.
    pub fn write_jsonl<W: Write>(&self, mut writer: W) -> anyhow::Result<()> {
        for turn in &self.turns {
            serde_json::to_writer(&mut writer, turn)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Read a transcript written by [`Transcript::write_jsonl`]. Blank lines
    /// are skipped.
    pub fn read_jsonl<R: BufRead>(reader: R) -> anyhow::Result<Self> {
        let mut turns = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let turn: Turn = serde_json::from_str(&line)
                .with_context(|| format!("Invalid transcript entry on line {}", i + 1))?;
            turns.push(turn);
        }
        Ok(Self { turns })
    }
}
