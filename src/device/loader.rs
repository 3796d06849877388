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

use crate::common::load_description;
use crate::error::DeviceError;
use super::model::{Device, DeviceDesc};

#[derive(Debug, Clone, Default)]
pub struct OpenOpts {
    pub raw: bool,
}

/// Load a device description.
///
/// RAW mode uses memory mapping and is recommended for debug builds due to
/// much faster load times on large devices. It requires an uncompressed file.
/// Files ending in `.gz` are always decompressed on the fly.
pub fn open<P>(path: P, opts: OpenOpts) -> Result<Device, DeviceError> where
    P: AsRef<Path>
{
    let desc: DeviceDesc = load_description(path, opts.raw)?;
    let device = Device::from_desc(desc)?;

    dbg_log!(
        crate::log::DBG_INFO,
        "Loaded device {} ({} tiles, {} sites, {} wire names)",
        crate::device::WireGraph::name(&device),
        device.tile_count(),
        device.site_count(),
        device.wire_enum_count()
    );

    Ok(device)
}
