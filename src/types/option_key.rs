// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;
use serde::Serialize;

/// One of the four answer options of a question.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum OptionKey {
    A,
    B,
    C,
    D,
}

impl OptionKey {
    pub const ALL: [OptionKey; 4] = [OptionKey::A, OptionKey::B, OptionKey::C, OptionKey::D];

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKey::A => "A",
            OptionKey::B => "B",
            OptionKey::C => "C",
            OptionKey::D => "D",
        }
    }
}

impl Display for OptionKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
