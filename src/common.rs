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

use std::path::Path;
use std::fs::File;
use std::io::{BufReader, Read};
use memmap2::Mmap;
use flate2::read::GzDecoder;
use serde::de::DeserializeOwned;

use crate::error::LoadError;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum DescFormat {
    Json,
    Yaml,
}

impl DescFormat {
    /// Guess the format from the file name, looking past a trailing `.gz`.
    pub fn from_path(path: &Path) -> Self {
        let name = path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("");
        let name = name.strip_suffix(".gz").unwrap_or(name);
        if name.ends_with(".yaml") || name.ends_with(".yml") {
            Self::Yaml
        } else {
            Self::Json
        }
    }

    pub fn parse<T>(self, bytes: &[u8]) -> Result<T, LoadError> where
        T: DeserializeOwned
    {
        match self {
            Self::Json => Ok(serde_json::from_slice(bytes)?),
            Self::Yaml => Ok(serde_yaml::from_slice(bytes)?),
        }
    }
}

pub fn is_gzipped(path: &Path) -> bool {
    path.extension().map(|ext| ext == "gz").unwrap_or(false)
}

/// Read a serialized description (JSON or YAML, optionally gzipped).
///
/// RAW mode memory-maps the file instead of reading it, which is considerably
/// faster for large uncompressed device descriptions. It is ignored for
/// gzipped files.
pub fn load_description<T, P>(path: P, raw: bool) -> Result<T, LoadError> where
    T: DeserializeOwned,
    P: AsRef<Path>
{
    let path = path.as_ref();
    let format = DescFormat::from_path(path);
    let file = File::open(path).map_err(|source| LoadError::CantOpenFile {
        path: path.display().to_string(),
        source,
    })?;

    if is_gzipped(path) {
        let mut bytes = Vec::new();
        BufReader::new(GzDecoder::new(file)).read_to_end(&mut bytes)?;
        return format.parse(&bytes);
    }

    if raw {
        /* UNSAFE DUE TO A POTENTIAL UB WHEN A FILE IS CHANGED! */
        let mmapped = unsafe { Mmap::map(&file) }?;
        return format.parse(&mmapped[..]);
    }

    let mut bytes = Vec::new();
    BufReader::new(file).read_to_end(&mut bytes)?;
    format.parse(&bytes)
}

/// Split a `/`-separated resource path and check that it has the expected
/// number of components. Returns the actual count on mismatch.
pub fn split_path(token: &str, expected: usize) -> Result<Vec<&str>, usize> {
    let parts: Vec<_> = token.split('/').collect();
    if parts.len() != expected {
        return Err(parts.len());
    }
    Ok(parts)
}
