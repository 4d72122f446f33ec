use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
struct Seen {
    existing: HashSet<PathBuf>,
    missing: HashSet<PathBuf>,
}

/// 记录已经输出过日志的资源路径，避免同一路径重复打印
///
/// 启动时创建，重新配置资源目录时调用 [`ResourceLogCache::clear`]。
/// 两个集合由同一把锁保护，路径在"存在/不存在"之间切换时是原子的。
#[derive(Debug, Default)]
pub struct ResourceLogCache {
    seen: Mutex<Seen>,
}

impl ResourceLogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 标记路径存在；首次出现或之前被标记为不存在时返回 true
    pub fn note_existing(&self, path: &Path) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        // 管理员可能在运行期间添加了文件
        seen.missing.remove(path);
        seen.existing.insert(path.to_path_buf())
    }

    /// 标记路径不存在；首次出现或之前被标记为存在时返回 true
    pub fn note_missing(&self, path: &Path) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        seen.existing.remove(path);
        seen.missing.insert(path.to_path_buf())
    }

    pub fn clear(&self) {
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        seen.existing.clear();
        seen.missing.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logs_once_per_state() {
        let cache = ResourceLogCache::new();
        let path = Path::new("/opt/projectforge/resources/logo.png");
        assert!(cache.note_missing(path));
        assert!(!cache.note_missing(path));
        assert!(cache.note_existing(path));
        assert!(!cache.note_existing(path));
        assert!(cache.note_missing(path));
    }

    #[test]
    fn clear_forgets_everything() {
        let cache = ResourceLogCache::new();
        let path = Path::new("fonts");
        assert!(cache.note_existing(path));
        cache.clear();
        assert!(cache.note_existing(path));
    }

    #[test]
    fn concurrent_callers_log_once() {
        use std::sync::Arc;

        let cache = Arc::new(ResourceLogCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.note_existing(Path::new("shared.xsl")))
            })
            .collect();
        let first_sightings = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|logged| *logged)
            .count();
        assert_eq!(first_sightings, 1);
    }
}
