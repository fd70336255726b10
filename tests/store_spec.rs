use scriptorium::models::*;
use scriptorium::store::{StorageError, Store, StoreKey};
use speculate2::speculate;

speculate! {
    before {
        let store = Store::open_memory().expect("Failed to create in-memory store");
        store.migrate().expect("Failed to run migrations");
    }

    describe "loading" {
        it "returns None for a key that was never written" {
            let tabs: Option<Vec<DocumentTab>> = store.load(StoreKey::Tabs);
            assert!(tabs.is_none());
        }

        it "returns None for malformed JSON" {
            store.try_save_text(StoreKey::Pages, "{not json").expect("Write failed");
            let pages: Option<Vec<Page>> = store.load(StoreKey::Pages);
            assert!(pages.is_none());
        }

        it "falls back to the supplied default" {
            store.try_save_text(StoreKey::Styles, "[1, 2").expect("Write failed");
            let styles: Vec<Style> = store.load_or_else(StoreKey::Styles, Vec::new);
            assert!(styles.is_empty());
        }

        it "decodes each key independently" {
            store.try_save_text(StoreKey::Tabs, "garbage").expect("Write failed");
            store
                .try_save(StoreKey::LibraryFolders, &vec![LibraryFolder::new("Notes")])
                .expect("Write failed");

            let tabs: Option<Vec<DocumentTab>> = store.load(StoreKey::Tabs);
            let folders: Vec<LibraryFolder> = store.load(StoreKey::LibraryFolders).expect("Missing folders");
            assert!(tabs.is_none());
            assert_eq!(folders[0].name, "Notes");
        }
    }

    describe "saving" {
        it "overwrites the previous value" {
            store.try_save_text(StoreKey::ProjectTitle, "First").expect("Write failed");
            store.try_save_text(StoreKey::ProjectTitle, "Second").expect("Write failed");
            assert_eq!(store.load_text(StoreKey::ProjectTitle).as_deref(), Some("Second"));
        }

        it "stores the project title as raw text" {
            store.save_text(StoreKey::ProjectTitle, "My Essay");
            assert_eq!(store.load_text(StoreKey::ProjectTitle).as_deref(), Some("My Essay"));
        }

        it "uses the fixed key names" {
            store.save(StoreKey::ContextFiles, &Vec::<ContextFile>::new());
            store.save(StoreKey::AiConfig, &AiConfig::default());
            let keys = store.keys().expect("Failed to list keys");
            assert_eq!(keys, vec!["ai_config".to_string(), "context_files".to_string()]);
        }

        it "removes a key" {
            store.save_text(StoreKey::ProjectTitle, "Gone soon");
            assert!(store.remove(StoreKey::ProjectTitle).expect("Remove failed"));
            assert!(!store.remove(StoreKey::ProjectTitle).expect("Remove failed"));
            assert!(store.load_text(StoreKey::ProjectTitle).is_none());
        }
    }

    describe "quota" {
        it "rejects values larger than the quota" {
            let store = store.clone().with_quota(Some(16));
            let result = store.try_save_text(StoreKey::ProjectTitle, &"x".repeat(17));
            assert!(matches!(result, Err(StorageError::QuotaExceeded { size: 17, limit: 16, .. })));
        }

        it "keeps the previous value when a write is rejected" {
            let store = store.clone().with_quota(Some(16));
            store.save_text(StoreKey::ProjectTitle, "short");
            store.save_text(StoreKey::ProjectTitle, &"x".repeat(64));
            assert_eq!(store.load_text(StoreKey::ProjectTitle).as_deref(), Some("short"));
        }
    }
}
