//! Adapter configuration validation.
//!
//! Runs once per call, before any value is visited, so a misconfigured
//! adapter list fails before any text is produced or consumed.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::adapter::Adapter;
use crate::error::ConfigError;
use crate::model::{is_reserved, Tag};

/// Validates that adapter tags are legal and unique.
///
/// The same adapter instance listed twice is allowed; two different adapters
/// declaring the same tag are not.
pub fn validate_adapters(adapters: &[Arc<dyn Adapter>]) -> Result<(), ConfigError> {
    let mut owners: FxHashMap<Tag, usize> = FxHashMap::default();

    for adapter in adapters {
        let tags = adapter.tags();
        if tags.is_empty() {
            debug!(adapter = adapter.name(), "adapter declares no tags");
            return Err(ConfigError::EmptyTagList {
                adapter: adapter.name().to_string(),
            });
        }

        let owner = Arc::as_ptr(adapter) as *const () as usize;
        for &tag in tags {
            if is_reserved(tag) {
                debug!(adapter = adapter.name(), tag, "adapter uses a reserved tag");
                return Err(ConfigError::ReservedTag { tag });
            }
            match owners.get(&tag) {
                Some(&existing) if existing != owner => {
                    debug!(adapter = adapter.name(), tag, "adapter tag is already taken");
                    return Err(ConfigError::DuplicateTag { tag });
                }
                Some(_) => {}
                None => {
                    owners.insert(tag, owner);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{builtin_adapters, DateAdapter, Packed};
    use crate::codec::Options;
    use crate::error::{DecodeError, EncodeError};
    use crate::model::Value;

    struct Fixed(&'static [Tag]);

    impl Adapter for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn tags(&self) -> &[Tag] {
            self.0
        }

        fn detect(&self, _value: &Value, _options: &Options) -> Option<Tag> {
            None
        }

        fn pack(&self, _tag: Tag, _value: &Value, _options: &Options) -> Result<Packed, EncodeError> {
            Ok(Packed::Unchanged)
        }

        fn unpack(
            &self,
            _tag: Tag,
            _payload: &serde_json::Value,
            _options: &Options,
        ) -> Result<Value, DecodeError> {
            Ok(Value::Null)
        }
    }

    #[test]
    fn test_builtins_are_valid() {
        assert!(validate_adapters(&builtin_adapters()).is_ok());
        assert!(validate_adapters(&[]).is_ok());
    }

    #[test]
    fn test_reserved_tag() {
        let adapters: Vec<Arc<dyn Adapter>> = vec![Arc::new(Fixed(&[99]))];
        assert_eq!(
            validate_adapters(&adapters),
            Err(ConfigError::ReservedTag { tag: 99 })
        );
    }

    #[test]
    fn test_duplicate_tag() {
        let adapters: Vec<Arc<dyn Adapter>> = vec![Arc::new(Fixed(&[200, 201])), Arc::new(Fixed(&[201]))];
        assert_eq!(
            validate_adapters(&adapters),
            Err(ConfigError::DuplicateTag { tag: 201 })
        );

        let adapters: Vec<Arc<dyn Adapter>> = vec![Arc::new(DateAdapter), Arc::new(DateAdapter)];
        assert!(validate_adapters(&adapters).is_err());
    }

    #[test]
    fn test_same_instance_twice() {
        let shared: Arc<dyn Adapter> = Arc::new(Fixed(&[300]));
        assert!(validate_adapters(&[shared.clone(), shared]).is_ok());
    }

    #[test]
    fn test_empty_tag_list() {
        let adapters: Vec<Arc<dyn Adapter>> = vec![Arc::new(Fixed(&[]))];
        assert!(matches!(
            validate_adapters(&adapters),
            Err(ConfigError::EmptyTagList { .. })
        ));
    }
}
