//! Named mapping profiles, starting from the ones shipped with the crate.

use crate::{
    errors::{ExportError, ExportResult},
    mapping::MappingProfile,
};

const BUILTIN: [&str; 6] = [
    include_str!("../profiles/yodlee.json"),
    include_str!("../profiles/credit_union.json"),
    include_str!("../profiles/ubs.json"),
    include_str!("../profiles/ms_money_report.json"),
    include_str!("../profiles/citi_mastercard_fr.json"),
    include_str!("../profiles/citi_mastercard_en.json"),
];

#[derive(Debug, Clone, Default)]
pub struct ProfileCatalog {
    profiles: Vec<MappingProfile>,
}

impl ProfileCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Yodlee, Credit Union, UBS, MS Money Report (CSV) and both Citi
    /// MasterCard statement languages.
    pub fn builtin() -> ExportResult<Self> {
        let mut catalog = Self::new();
        for json in BUILTIN {
            catalog.register(MappingProfile::from_json(json)?);
        }
        tracing::debug!(profiles = catalog.len(), "loaded built-in profiles");
        Ok(catalog)
    }

    /// Adds a profile, replacing and returning any profile of the same name.
    pub fn register(&mut self, profile: MappingProfile) -> Option<MappingProfile> {
        match self.profiles.iter_mut().find(|p| p.name == profile.name) {
            Some(existing) => Some(std::mem::replace(existing, profile)),
            None => {
                self.profiles.push(profile);
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&MappingProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    pub fn require(&self, name: &str) -> ExportResult<&MappingProfile> {
        self.get(name)
            .ok_or_else(|| ExportError::Configuration(format!("no mapping profile named '{name}'")))
    }

    /// Profile names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
