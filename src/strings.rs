/* Copyright (C) 2022 Antmicro
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     https://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use std::collections::HashMap;
use std::borrow::Borrow;

/// Identifier of a string interned in a [`StringPool`].
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct StringId(pub u32);

/// Owned string interner. Each distinct string gets exactly one id, and ids
/// are handed out densely in insertion order.
#[derive(Default, Clone, Debug)]
pub struct StringPool {
    strings: Vec<String>,
    revmap: HashMap<String, StringId>,
}

impl StringPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an identifier for a provided string. Creates a new identifier if the
    /// string was not registered. Returns an existing identifier if the string has been
    /// already registered.
    pub fn intern<S>(&mut self, s: S) -> StringId where
        S: ToString + Borrow<str>
    {
        if let Some(id) = self.revmap.get(s.borrow()) {
            return *id;
        }

        let id = StringId(self.strings.len() as u32);
        let s = s.to_string();
        self.revmap.insert(s.clone(), id);
        self.strings.push(s);

        id
    }

    /// Look up a string without registering it.
    pub fn lookup(&self, s: &str) -> Option<StringId> {
        self.revmap.get(s).copied()
    }

    pub fn get(&self, id: StringId) -> &str {
        &self.strings[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StringId, &str)> + '_ {
        self.strings.iter()
            .enumerate()
            .map(|(idx, s)| (StringId(idx as u32), s.as_str()))
    }
}

impl std::ops::Index<StringId> for StringPool {
    type Output = str;

    fn index(&self, id: StringId) -> &Self::Output {
        self.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_is_stable() {
        let mut pool = StringPool::new();
        let a = pool.intern("CLBLL_L_A1");
        let b = pool.intern("CLBLL_L_B1");
        let a2 = pool.intern(String::from("CLBLL_L_A1"));

        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_eq!(pool.len(), 2);
        assert_eq!(&pool[b], "CLBLL_L_B1");
        assert_eq!(pool.lookup("CLBLL_L_B1"), Some(b));
        assert_eq!(pool.lookup("missing"), None);
    }
}
