//! TOML description of a rendered evaluation page.
//!
//! ```toml
//! elements = ["overall-7"]
//!
//! [selectors.setor-7]
//! collaborator_id = "7"
//! sector = "Producao"
//!
//! [forms.form-7]
//! status = "save-status-7"
//! ```

use std::{fs, path::Path};

use anyhow::Context;
use client_core::{MemoryRenderer, PageBindings};
use serde::Deserialize;
use shared::domain::ElementKey;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PageDescription {
    /// Elements present on the page besides the forms' status indicators.
    #[serde(default)]
    pub elements: Vec<ElementKey>,
    #[serde(flatten)]
    pub bindings: PageBindings,
}

impl PageDescription {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read page description '{}'", path.display()))?;
        Self::parse(&raw)
            .with_context(|| format!("failed to parse page description '{}'", path.display()))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn renderer(&self) -> MemoryRenderer {
        let renderer = MemoryRenderer::with_elements(self.elements.iter().cloned());
        for form in self.bindings.forms.values() {
            renderer.register(form.status.clone());
        }
        renderer
    }
}
