//! Self-contained crasher emission.
//!
//! A crasher is the serialized sample prefixed with a license header, with
//! the triggering error recorded in the config, scrubbed of anything that
//! should not leave the machine it was produced on.

use crate::sample::Sample;
use chrono::Datelike;

/// Emits a crasher file for a sample that triggered `error_message`.
///
/// The license header carries the current civil year. The result is passed
/// through [`scrub_crasher`] before being returned.
pub fn to_crasher_text(sample: &Sample, error_message: &str) -> String {
    let year = chrono::Utc::now().year();
    let license = format!(
        r#"// Copyright {year} The Vesper Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
"#
    );
    scrub_crasher(format!("{license}{}", sample.serialize(Some(error_message))))
}

impl Sample {
    /// Emits this sample as a crasher file; see [`to_crasher_text`].
    pub fn to_crasher(&self, error_message: &str) -> String {
        to_crasher_text(self, error_message)
    }
}

/// Strips machine-local detail from a crasher before it is shared: ANSI
/// escape sequences anywhere, and absolute filesystem paths inside the
/// recorded exception, which are reduced to their final component.
pub fn scrub_crasher(text: String) -> String {
    let mut out = Vec::new();
    for line in text.lines() {
        let line = strip_ansi(line);
        if line.starts_with("// exception:") {
            out.push(scrub_paths(&line));
        } else {
            out.push(line);
        }
    }
    let mut joined = out.join("\n");
    if text.ends_with('\n') {
        joined.push('\n');
    }
    joined
}

fn strip_ansi(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\x1b' {
            out.push(c);
            continue;
        }
        // Skip a CSI sequence: ESC '[' parameters, terminated by a letter.
        if chars.peek() == Some(&'[') {
            chars.next();
            for terminator in chars.by_ref() {
                if terminator.is_ascii_alphabetic() {
                    break;
                }
            }
        }
    }
    out
}

fn scrub_paths(line: &str) -> String {
    let scrubbed: Vec<String> = line
        .split(' ')
        .map(|token| {
            let trimmed = token.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '/');
            if trimmed.starts_with('/') && trimmed.contains('/') {
                match trimmed.rsplit('/').next() {
                    Some(base) if !base.is_empty() => token.replace(trimmed, base),
                    _ => token.to_string(),
                }
            } else {
                token.to_string()
            }
        })
        .collect();
    scrubbed.join(" ")
}
