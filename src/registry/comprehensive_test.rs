//! Comprehensive tests for the registry against every store backend

#[cfg(test)]
mod integration_tests {
    use serde_json::json;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    use crate::registry::{Coordinate, LocationRegistry, Outcome};
    use crate::store::file_store::JsonFileStore;
    use crate::store::mock_store::MockDocumentStore;
    use crate::store::DocumentStore;

    /// Build one registry per backend; the TempDir must outlive the file store
    fn backends() -> Vec<(&'static str, Arc<dyn DocumentStore>, Option<TempDir>)> {
        let dir = tempfile::tempdir().expect("tempdir");
        let file_store: Arc<dyn DocumentStore> =
            Arc::new(JsonFileStore::new(dir.path().join("data.json")).expect("file store"));
        let mock_store: Arc<dyn DocumentStore> = Arc::new(MockDocumentStore::new());
        vec![("mock", mock_store, None), ("file", file_store, Some(dir))]
    }

    #[test]
    fn test_unknown_server_not_found() {
        for (name, store, _dir) in backends() {
            let registry = LocationRegistry::new(store);
            assert_eq!(registry.list_locations("nobody").unwrap(), None, "{}", name);
        }
    }

    #[test]
    fn test_add_user_idempotent() {
        for (name, store, _dir) in backends() {
            let registry = LocationRegistry::new(store.clone());
            registry.add_user("s", "u").unwrap();
            let once = store.load().unwrap();
            registry.add_user("s", "u").unwrap();

            assert_eq!(store.load().unwrap(), once, "{}", name);
            assert_eq!(once["s"]["userIds"], json!(["u"]), "{}", name);
        }
    }

    #[test]
    fn test_add_location_round_trip() {
        for (name, store, _dir) in backends() {
            let registry = LocationRegistry::new(store);
            let coords = json!({"lat": 48.85, "lng": 2.35});
            registry.add_location("s", coords.clone(), "loc1", "u").unwrap();

            let items = registry.list_locations("s").unwrap().expect("server present");
            assert!(
                items.contains(&Coordinate { coords, location: "loc1".to_string() }),
                "{}",
                name
            );
        }
    }

    #[test]
    fn test_remove_user_cascade_delete() {
        for (name, store, _dir) in backends() {
            let registry = LocationRegistry::new(store.clone());
            registry.add_user("s", "u").unwrap();
            assert_eq!(registry.remove_user("s", "u").unwrap(), Outcome::Applied);

            assert!(!store.load().unwrap().contains_key("s"), "{}", name);
            assert_eq!(registry.list_locations("s").unwrap(), None, "{}", name);
        }
    }

    #[test]
    fn test_remove_user_discards_remaining_locations() {
        for (name, store, _dir) in backends() {
            let registry = LocationRegistry::new(store);
            registry.add_user("s", "u1").unwrap();
            registry.add_location("s", json!({}), "L", "u1").unwrap();
            registry.remove_user("s", "u1").unwrap();

            assert_eq!(registry.list_locations("s").unwrap(), None, "{}", name);
        }
    }

    #[test]
    fn test_remove_user_not_found_message_path() {
        for (name, store, _dir) in backends() {
            let registry = LocationRegistry::new(store);
            assert_eq!(registry.remove_user("s", "u").unwrap(), Outcome::NotFound, "{}", name);
            registry.add_user("s", "u").unwrap();
            assert_eq!(registry.remove_user("s", "other").unwrap(), Outcome::NotFound, "{}", name);
        }
    }

    #[test]
    fn test_legacy_shape_listing() {
        let store = Arc::new(MockDocumentStore::from_json(json!({
            "s1": [{"coords": {"x": 1}, "location": "A", "userId": "u1"}]
        })));
        let registry = LocationRegistry::new(store);

        let items = registry.list_locations("s1").unwrap().unwrap();
        assert_eq!(items, vec![Coordinate { coords: json!({"x": 1}), location: "A".to_string() }]);
    }

    #[test]
    fn test_remove_location_first_match_only() {
        for (name, store, _dir) in backends() {
            let registry = LocationRegistry::new(store);
            registry.add_location("s", json!(1), "dup", "u").unwrap();
            registry.add_location("s", json!(2), "dup", "u").unwrap();

            assert_eq!(registry.remove_location("s", "u", "dup").unwrap(), Outcome::Applied);
            let items = registry.list_locations("s").unwrap().unwrap();
            assert_eq!(items, vec![Coordinate { coords: json!(2), location: "dup".to_string() }], "{}", name);
        }
    }

    #[test]
    fn test_concurrent_mutations_are_not_lost() {
        for (name, store, _dir) in backends() {
            let registry = Arc::new(LocationRegistry::new(store.clone()));

            let handles: Vec<_> = (0..16)
                .map(|i| {
                    let registry = Arc::clone(&registry);
                    thread::spawn(move || {
                        registry.add_user(&format!("server-{}", i), "u").unwrap();
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            let document = store.load().unwrap();
            assert_eq!(document.len(), 16, "{}", name);
        }
    }
}
