//! 插件注册表
//!
//! 启动时一次性构建，之后只读，通过 `AppState` 显式传递。

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

/// 访问权限定义
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RightDescriptor {
    pub id: String,
    pub i18n_key: String,
}

/// 菜单项，挂在 `parent` 菜单下
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MenuEntry {
    pub parent: String,
    pub id: String,
    pub i18n_key: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PluginDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
    pub rights: Vec<RightDescriptor>,
    pub menu_entries: Vec<MenuEntry>,
    pub resource_bundles: Vec<String>,
}

impl PluginDescriptor {
    pub fn new(id: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            description: description.to_string(),
            rights: Vec::new(),
            menu_entries: Vec::new(),
            resource_bundles: Vec::new(),
        }
    }

    pub fn with_right(mut self, id: &str, i18n_key: &str) -> Self {
        self.rights.push(RightDescriptor {
            id: id.to_string(),
            i18n_key: i18n_key.to_string(),
        });
        self
    }

    pub fn with_menu_entry(mut self, parent: &str, i18n_key: &str) -> Self {
        self.menu_entries.push(MenuEntry {
            parent: parent.to_string(),
            id: self.id.clone(),
            i18n_key: i18n_key.to_string(),
        });
        self
    }

    pub fn with_resource_bundle(mut self, bundle: &str) -> Self {
        self.resource_bundles.push(bundle.to_string());
        self
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("plugin {0:?} registered twice")]
    Duplicate(String),

    #[error("plugin id must not be empty")]
    EmptyId,
}

#[derive(Debug, Default, Clone)]
pub struct PluginRegistry {
    plugins: BTreeMap<String, PluginDescriptor>,
}

impl PluginRegistry {
    pub fn build(
        descriptors: impl IntoIterator<Item = PluginDescriptor>,
    ) -> Result<Self, RegistryError> {
        let mut plugins = BTreeMap::new();
        for descriptor in descriptors {
            if descriptor.id.trim().is_empty() {
                return Err(RegistryError::EmptyId);
            }
            if plugins.contains_key(&descriptor.id) {
                return Err(RegistryError::Duplicate(descriptor.id));
            }
            tracing::info!("Plugin '{}' registered", descriptor.id);
            plugins.insert(descriptor.id.clone(), descriptor);
        }
        Ok(Self { plugins })
    }

    /// 内置插件
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::build(builtin_plugins())
    }

    pub fn get(&self, id: &str) -> Option<&PluginDescriptor> {
        self.plugins.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PluginDescriptor> {
        self.plugins.values()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// 某个父菜单下所有插件菜单项
    pub fn menu_entries<'a>(&'a self, parent: &'a str) -> impl Iterator<Item = &'a MenuEntry> + 'a {
        self.plugins
            .values()
            .flat_map(|p| p.menu_entries.iter())
            .filter(move |m| m.parent == parent)
    }
}

pub fn builtin_plugins() -> Vec<PluginDescriptor> {
    vec![
        PluginDescriptor::new("ihkexport", "IHK-Export der Zeitberichte")
            .with_right("PLUGIN_IHKEXPORT", "plugins.ihkexport")
            .with_menu_entry("MISC", "plugins.ihkexport.menu")
            .with_resource_bundle("IhkExportI18nResources"),
        PluginDescriptor::new("poll", "Fuer die Durchfuehrung von Anfragen")
            .with_right("PLUGIN_POLL", "plugins.poll")
            .with_menu_entry("MISC", "plugins.poll.menu")
            .with_resource_bundle("PollI18nResources"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_contains_known_plugins() {
        let registry = PluginRegistry::builtin().unwrap();
        assert_eq!(registry.len(), 2);
        let ihk = registry.get("ihkexport").unwrap();
        assert_eq!(ihk.resource_bundles, vec!["IhkExportI18nResources"]);
        assert_eq!(ihk.rights[0].id, "PLUGIN_IHKEXPORT");
        assert_eq!(
            registry.get("poll").unwrap().description,
            "Fuer die Durchfuehrung von Anfragen"
        );
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = PluginRegistry::build([
            PluginDescriptor::new("poll", "a"),
            PluginDescriptor::new("poll", "b"),
        ])
        .unwrap_err();
        assert_eq!(err, RegistryError::Duplicate("poll".into()));
    }

    #[test]
    fn empty_id_is_rejected() {
        assert_eq!(
            PluginRegistry::build([PluginDescriptor::new(" ", "x")]).unwrap_err(),
            RegistryError::EmptyId
        );
    }

    #[test]
    fn menu_entries_filter_by_parent() {
        let registry = PluginRegistry::build([
            PluginDescriptor::new("a", "").with_menu_entry("MISC", "a.menu"),
            PluginDescriptor::new("b", "").with_menu_entry("HR", "b.menu"),
        ])
        .unwrap();
        let misc: Vec<_> = registry.menu_entries("MISC").map(|m| m.id.as_str()).collect();
        assert_eq!(misc, vec!["a"]);
    }
}
