// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Custom project attributes served under
//! `/computeMetadata/v1/project/attributes/{key}`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

type Attributes = Arc<HashMap<String, String>>;

/// A string to string map, replaced as a whole.
///
/// Readers get a snapshot of the map. A [load][AttributeStore::load] never
/// exposes a partially updated map.
#[derive(Debug)]
pub struct AttributeStore {
    attributes: RwLock<Attributes>,
}

impl Default for AttributeStore {
    fn default() -> Self {
        Self::new(HashMap::from([
            ("k1".to_string(), "v1".to_string()),
            ("k2".to_string(), "v2".to_string()),
        ]))
    }
}

impl AttributeStore {
    pub fn new(attributes: HashMap<String, String>) -> Self {
        Self {
            attributes: RwLock::new(Arc::new(attributes)),
        }
    }

    fn snapshot(&self) -> Attributes {
        match self.attributes.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Returns the value for `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.snapshot().get(key).cloned()
    }

    /// Replaces the attributes with the JSON object in `path`.
    ///
    /// An empty `path` does nothing. Errors are logged and leave the current
    /// attributes in place.
    pub async fn load<P: AsRef<Path>>(&self, path: P) {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return;
        }
        let contents = match tokio::fs::read(path).await {
            Ok(c) => c,
            Err(e) => {
                tracing::error!("cannot read custom attributes from {}: {e}", path.display());
                return;
            }
        };
        let attributes = match serde_json::from_slice::<HashMap<String, String>>(&contents) {
            Ok(a) => a,
            Err(e) => {
                tracing::error!(
                    "cannot parse custom attributes from {}: {e}",
                    path.display()
                );
                return;
            }
        };
        tracing::info!(
            "loaded {} custom attributes from {}",
            attributes.len(),
            path.display()
        );
        let attributes = Arc::new(attributes);
        match self.attributes.write() {
            Ok(mut guard) => *guard = attributes,
            Err(poisoned) => *poisoned.into_inner() = attributes,
        }
    }
}
