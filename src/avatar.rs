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

use percent_encoding::utf8_percent_encode;

use crate::client::URI_COMPONENT;

const AVATAR_BASE_URL: &str = "https://api.dicebear.com/7.x/pixel-art/svg";
const AVATAR_COUNT: usize = 100;

/// Avatar URLs for the level bosses, computed once at startup. Purely
/// cosmetic.
#[derive(Clone, Debug)]
pub struct AvatarCache {
    urls: Vec<String>,
}

impl AvatarCache {
    pub fn init() -> Self {
        let urls = (1..=AVATAR_COUNT)
            .map(|i| avatar_url(&format!("boss-{i}")))
            .collect();
        log::debug!("Prepared {AVATAR_COUNT} avatars.");
        Self { urls }
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// The boss avatar for a 1-based level. Levels past the last avatar wrap
    /// around.
    pub fn for_level(&self, level: usize) -> String {
        let index = level.saturating_sub(1) % AVATAR_COUNT;
        match self.urls.get(index) {
            Some(url) => url.clone(),
            None => avatar_url(&format!("boss-{level}")),
        }
    }

    /// The avatar for an arbitrary seed.
    pub fn get(&self, seed: &str) -> String {
        avatar_url(seed)
    }
}

fn avatar_url(seed: &str) -> String {
    let seed = utf8_percent_encode(seed, URI_COMPONENT);
    format!("{AVATAR_BASE_URL}?seed={seed}&backgroundColor=transparent")
}
