// Copyright (C) 2022 Yehowshua Immanuel
// This program is distributed under both the GPLV3 license
// and the YEHOWSHUA license, both of which can be found at
// the root of the folder containing the sources for this program.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    Sequential,
    #[default]
    Parallel,
}

/// How [`parse_vcd`](super::parse_vcd) loads the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadOptions {
    /// `None` picks a worker count from the body size.
    pub workers: Option<usize>,
    pub mode: LoadMode,
}

impl LoadOptions {
    pub fn sequential() -> LoadOptions {
        LoadOptions {
            workers: None,
            mode: LoadMode::Sequential,
        }
    }

    pub fn parallel() -> LoadOptions {
        LoadOptions::default()
    }

    pub fn with_workers(mut self, workers: usize) -> LoadOptions {
        self.workers = Some(workers);
        self
    }

    pub fn with_mode(mut self, mode: LoadMode) -> LoadOptions {
        self.mode = mode;
        self
    }
}
