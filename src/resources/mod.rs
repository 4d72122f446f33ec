//! 资源目录解析
//!
//! 优先读取应用目录下 `resources/` 中管理员提供的文件，不存在时退回编译进程序的默认资源。
//! 每个路径的"存在/不存在"状态只记录一次日志，见 [`ResourceLogCache`]。

use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;

use crate::cache::ResourceLogCache;
use crate::config::Config;

/// 编译进程序的默认资源
const BUILTIN_RESOURCES: &[(&str, &str)] = &[
    (
        "templates/password-changed.txt",
        include_str!("../../assets/templates/password-changed.txt"),
    ),
    (
        "templates/stay-logged-in-renewed.txt",
        include_str!("../../assets/templates/stay-logged-in-renewed.txt"),
    ),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDirs {
    pub resource_dir: PathBuf,
    pub fonts_dir: PathBuf,
}

impl ResourceDirs {
    /// 相对路径以应用目录为基准
    pub fn resolve(home: &Path, resource_dir: &str, fonts_dir: &str) -> Self {
        Self {
            resource_dir: absolute(home, resource_dir),
            fonts_dir: absolute(home, fonts_dir),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResourceContent {
    pub content: String,
    /// 文件系统中的 `file://` 路径或 `builtin:` 名称
    pub location: String,
}

pub struct ResourceService {
    dirs: RwLock<ResourceDirs>,
    logo_file: Option<String>,
    log_cache: Arc<ResourceLogCache>,
}

impl ResourceService {
    pub fn new(
        dirs: ResourceDirs,
        logo_file: Option<String>,
        log_cache: Arc<ResourceLogCache>,
    ) -> io::Result<Self> {
        ensure_dir(&dirs.resource_dir)?;
        ensure_dir(&dirs.fonts_dir)?;
        Ok(Self {
            dirs: RwLock::new(dirs),
            logo_file: logo_file.filter(|f| !f.trim().is_empty()),
            log_cache,
        })
    }

    pub fn from_config(config: &Config, log_cache: Arc<ResourceLogCache>) -> io::Result<Self> {
        let dirs = ResourceDirs::resolve(
            &config.application_home_dir,
            &config.resources_dir,
            &config.fonts_dir,
        );
        ensure_dir(&config.application_home_dir.join("plugins"))?;
        Self::new(dirs, config.logo_file.clone(), log_cache)
    }

    /// 切换资源目录，并清空日志去重缓存
    pub fn reconfigure(&self, dirs: ResourceDirs) -> io::Result<()> {
        ensure_dir(&dirs.resource_dir)?;
        ensure_dir(&dirs.fonts_dir)?;
        *self.dirs.write().unwrap_or_else(PoisonError::into_inner) = dirs;
        self.log_cache.clear();
        tracing::info!("Resource directories reconfigured");
        Ok(())
    }

    pub fn resource_dir(&self) -> PathBuf {
        self.dirs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .resource_dir
            .clone()
    }

    pub fn fonts_dir(&self) -> PathBuf {
        self.dirs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .fonts_dir
            .clone()
    }

    /// 读取资源内容：先查资源目录，再查内置资源
    pub async fn resource_as_string(&self, filename: &str) -> Option<ResourceContent> {
        let Some(relative) = safe_relative_path(filename) else {
            tracing::warn!("Rejected resource path: {:?}", filename);
            return None;
        };

        let base = self.resource_dir();
        if base.is_dir() {
            let file = base.join(&relative);
            if file.is_file() {
                match tokio::fs::read_to_string(&file).await {
                    Ok(content) => {
                        if self.log_cache.note_existing(&file) {
                            tracing::info!("Using existing file: {}", file.display());
                        }
                        return Some(ResourceContent {
                            content,
                            location: format!("file://{}", file.display()),
                        });
                    }
                    Err(e) => tracing::error!("{}: {}", file.display(), e),
                }
            } else if self.log_cache.note_missing(&file) {
                tracing::info!(
                    "Using default file of ProjectForge, because file '{}' does not exist (OK)",
                    file.display()
                );
            }
        }

        let key = relative.to_string_lossy().replace('\\', "/");
        match BUILTIN_RESOURCES.iter().find(|(name, _)| *name == key) {
            Some((name, content)) => Some(ResourceContent {
                content: (*content).to_string(),
                location: format!("builtin:{}", name),
            }),
            None => {
                tracing::error!(
                    "File '{}' not found (neither in file system under '{}' nor built in)",
                    filename,
                    base.display()
                );
                None
            }
        }
    }

    /// 对外展示的 logo 文件名，按扩展名推断
    pub fn synthetic_logo_name(&self) -> Option<&'static str> {
        let logo = self.logo_file.as_deref()?;
        if logo.ends_with(".png") {
            Some("logo.png")
        } else if logo.ends_with(".jpg") || logo.ends_with(".jpeg") {
            Some("logo.jpg")
        } else {
            Some("logo.gif")
        }
    }

    /// logo 文件路径：绝对路径直接使用，否则位于 `<resources>/images/`
    pub fn logo_file_path(&self) -> Option<PathBuf> {
        let logo = self.logo_file.as_deref()?;
        let path = Path::new(logo);
        if path.is_absolute() {
            Some(path.to_path_buf())
        } else {
            Some(self.resource_dir().join("images").join(path))
        }
    }

    pub fn is_logo_file_valid(&self) -> bool {
        self.logo_file_path().is_some_and(|p| p.is_file())
    }
}

fn absolute(home: &Path, dir: &str) -> PathBuf {
    let path = Path::new(dir);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        home.join(path)
    }
}

/// 只接受不含 `..`、不以根开头的相对路径
fn safe_relative_path(filename: &str) -> Option<PathBuf> {
    let path = Path::new(filename.trim_start_matches('/'));
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    (!out.as_os_str().is_empty()).then_some(out)
}

fn ensure_dir(dir: &Path) -> io::Result<()> {
    if !dir.exists() {
        tracing::info!("Creating directory {}", dir.display());
        std::fs::create_dir_all(dir)?;
    }
    if !dir.is_dir() {
        tracing::error!("Can't create directory: {}", dir.display());
        return Err(io::Error::other(format!(
            "{} is not a directory",
            dir.display()
        )));
    }
    Ok(())
}
