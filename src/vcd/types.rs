// Copyright (C) 2022 Yehowshua Immanuel
// This program is distributed under both the GPLV3 license
// and the YEHOWSHUA license, both of which can be found at
// the root of the folder containing the sources for this program.
use std::collections::HashMap;
use std::time::Duration;

use super::buffer::VcdBuffer;
use super::signal::Pin;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timescale {
    Fs,
    Ps,
    Ns,
    Us,
    Ms,
    S,
    Unit,
}

/// Text of the `$date`, `$version` and `$timescale` directives. Date and
/// version words are joined by single spaces, the timescale words are
/// joined without any, so `1 ns` reads as `1ns`.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub(super) date: String,
    pub(super) version: String,
    pub(super) timescale: String,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleIdx(pub usize);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PinIdx(pub usize);

#[derive(Debug)]
pub struct Module {
    pub(super) name: String,
    pub(super) parent_idx: Option<ModuleIdx>,
    pub(super) self_idx: ModuleIdx,
    pub(super) child_pins: Vec<PinIdx>,
    pub(super) child_modules: Vec<ModuleIdx>,
}

impl Module {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn idx(&self) -> ModuleIdx {
        self.self_idx
    }

    /// `None` for a root module.
    pub fn parent(&self) -> Option<ModuleIdx> {
        self.parent_idx
    }

    pub fn child_modules(&self) -> &[ModuleIdx] {
        &self.child_modules
    }

    pub fn pins(&self) -> &[PinIdx] {
        &self.child_pins
    }
}

/// Half-open `[start, end)` range of time during which dumping was
/// suspended by `$dumpoff`. Every signal holds its last value inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpOffInterval {
    pub start: u64,
    pub end: u64,
}

impl DumpOffInterval {
    pub fn contains(&self, timestamp: u64) -> bool {
        self.start <= timestamp && timestamp < self.end
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoadStats {
    pub workers: usize,
    pub recorded_changes: usize,
    /// Body records whose alias was never declared in a retained scope.
    pub unknown_alias_records: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum LoadState {
    Opened,
    HeaderLoaded,
    BodyLoaded,
}

/// One parsed dump. Owns the byte buffer, the module tree, every pin and
/// the alias index. Read-only once the body is loaded.
pub struct Handle {
    pub(super) metadata: Metadata,
    pub(super) max_timestamp: u64,
    pub(super) all_modules: Vec<Module>,
    pub(super) root_modules: Vec<ModuleIdx>,
    pub(super) all_pins: Vec<Pin>,
    pub(super) alias_map: HashMap<String, PinIdx>,
    pub(super) dumpoff_intervals: Vec<DumpOffInterval>,
    pub(super) body_offset: usize,
    pub(super) state: LoadState,
    pub(super) stats: LoadStats,
    pub(super) buffer: VcdBuffer,
}

impl Handle {
    pub(super) fn with_buffer(buffer: VcdBuffer) -> Handle {
        Handle {
            metadata: Metadata::default(),
            max_timestamp: 0,
            all_modules: vec![],
            root_modules: vec![],
            all_pins: vec![],
            alias_map: HashMap::new(),
            dumpoff_intervals: vec![],
            body_offset: 0,
            state: LoadState::Opened,
            stats: LoadStats::default(),
            buffer,
        }
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn date(&self) -> &str {
        &self.metadata.date
    }

    pub fn version(&self) -> &str {
        &self.metadata.version
    }

    pub fn timescale(&self) -> &str {
        &self.metadata.timescale
    }

    pub fn max_timestamp(&self) -> u64 {
        self.max_timestamp
    }

    /// The first top level module. Files with several top level scopes
    /// expose the others through [`Handle::root_modules`].
    pub fn root_module(&self) -> Option<&Module> {
        self.root_modules.first().map(|idx| self.module(*idx))
    }

    pub fn root_modules(&self) -> impl Iterator<Item = &Module> + '_ {
        self.root_modules.iter().map(|idx| self.module(*idx))
    }

    pub fn module(&self, idx: ModuleIdx) -> &Module {
        let ModuleIdx(idx) = idx;
        &self.all_modules[idx]
    }

    pub fn modules(&self) -> &[Module] {
        &self.all_modules
    }

    pub fn parent_of(&self, module: &Module) -> Option<&Module> {
        module.parent().map(|idx| self.module(idx))
    }

    pub fn child_modules_of<'a>(&'a self, module: &'a Module) -> impl Iterator<Item = &'a Module> + 'a {
        module.child_modules().iter().map(|idx| self.module(*idx))
    }

    pub fn pins_of<'a>(&'a self, module: &'a Module) -> impl Iterator<Item = &'a Pin> + 'a {
        module.pins().iter().map(|idx| self.pin(*idx))
    }

    pub fn pin(&self, idx: PinIdx) -> &Pin {
        let PinIdx(idx) = idx;
        &self.all_pins[idx]
    }

    pub fn pins(&self) -> &[Pin] {
        &self.all_pins
    }

    pub fn pin_by_alias(&self, alias: &str) -> Option<&Pin> {
        self.alias_map.get(alias).map(|idx| self.pin(*idx))
    }

    pub fn alias_map(&self) -> &HashMap<String, PinIdx> {
        &self.alias_map
    }

    pub fn dumpoff_intervals(&self) -> &[DumpOffInterval] {
        &self.dumpoff_intervals
    }

    pub fn is_dumped_off(&self, timestamp: u64) -> bool {
        self.dumpoff_intervals
            .iter()
            .any(|interval| interval.contains(timestamp))
    }

    pub fn load_stats(&self) -> &LoadStats {
        &self.stats
    }

    pub fn unknown_alias_count(&self) -> usize {
        self.stats.unknown_alias_records
    }

    pub fn is_loaded(&self) -> bool {
        self.state == LoadState::BodyLoaded
    }

    /// Dotted path of module names from the root down to `idx`.
    pub fn module_path(&self, idx: ModuleIdx) -> String {
        let mut names = vec![];
        let mut curr = Some(idx);
        while let Some(module_idx) = curr {
            let module = self.module(module_idx);
            names.push(module.name());
            curr = module.parent();
        }
        names.reverse();
        names.join(".")
    }

    /// Hierarchical name of a pin through the module that first declared it.
    pub fn full_name(&self, idx: PinIdx) -> String {
        let pin = self.pin(idx);
        format!("{}.{}", self.module_path(pin.parent()), pin.name())
    }

    pub(super) fn bytes(&self) -> &[u8] {
        self.buffer.as_bytes()
    }
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("bytes", &self.buffer.len())
            .field("metadata", &self.metadata)
            .field("max_timestamp", &self.max_timestamp)
            .field("modules", &self.all_modules.len())
            .field("pins", &self.all_pins.len())
            .field("state", &self.state)
            .finish()
    }
}
