use std::collections::BTreeMap;
use std::sync::Arc;

use save_core::{
    FileBackend, Format, InMemoryBackend, PreferencesBackend, ProfileId, Record, RegistryOptions,
    SaveRegistry, StorageBackend,
};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct GameData {
    first_open: bool,
    first_play: bool,
}

impl Record for GameData {
    const KEY: &'static str = "GameData";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Progress {
    level: u16,
    coins: i64,
    best_time: f64,
    player_name: String,
    unlocked_skins: Vec<String>,
    stars: BTreeMap<String, u8>,
    pending_reward: Option<u32>,
}

impl Default for Progress {
    fn default() -> Self {
        let mut stars = BTreeMap::new();
        stars.insert("level_1".to_string(), 3);

        Self {
            level: 1,
            coins: 250,
            best_time: 93.25,
            player_name: "Player".to_string(),
            unlocked_skins: vec!["classic".to_string()],
            stars,
            pending_reward: None,
        }
    }
}

impl Record for Progress {
    const KEY: &'static str = "Progress";
}

fn profile(id: &str) -> ProfileId {
    ProfileId::new(id).unwrap()
}

/// One instance of every shipped backend, each rooted in its own temp dir.
fn backends(temp_dir: &TempDir) -> Vec<Arc<dyn StorageBackend>> {
    vec![
        Arc::new(InMemoryBackend::new()),
        Arc::new(FileBackend::new(temp_dir.path().join("files")).unwrap()),
        Arc::new(PreferencesBackend::open(temp_dir.path().join("prefs.json")).unwrap()),
    ]
}

fn stored<T: Record>(backend: &dyn StorageBackend, profile: &ProfileId, format: Format) -> T {
    let bytes = backend.read(profile, T::KEY).unwrap();
    format.decode(T::KEY, &bytes).unwrap()
}

#[test]
fn game_data_scenario_on_every_backend() {
    let temp_dir = TempDir::new().unwrap();

    for backend in backends(&temp_dir) {
        let main = profile("main");
        let mut registry = SaveRegistry::new(backend.clone(), main.clone());

        // First access creates and persists the default.
        assert!(!backend.exists(&main, "GameData").unwrap());
        assert_eq!(
            registry.instance::<GameData>().unwrap(),
            &GameData::default(),
            "{}",
            backend.name()
        );
        assert!(backend.exists(&main, "GameData").unwrap());
        assert_eq!(
            stored::<GameData>(backend.as_ref(), &main, Format::Json),
            GameData {
                first_open: false,
                first_play: false
            }
        );

        // Committing one field keeps the other.
        registry
            .update::<GameData, _>(|data| data.first_open = true)
            .unwrap();
        assert_eq!(
            stored::<GameData>(backend.as_ref(), &main, Format::Json),
            GameData {
                first_open: true,
                first_play: false
            },
            "{}",
            backend.name()
        );
    }
}

#[test]
fn file_backend_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let main = profile("main");

    {
        let backend = FileBackend::new(temp_dir.path()).unwrap();
        let mut registry = SaveRegistry::new(backend, main.clone());
        registry.instance_mut::<Progress>().unwrap().coins = 9_000;
        registry.instance_mut::<Progress>().unwrap().pending_reward = Some(5);
        assert_eq!(registry.save_dirty().unwrap(), 1);
    }

    let backend = FileBackend::new(temp_dir.path()).unwrap();
    let mut registry = SaveRegistry::new(backend, main);
    let progress = registry.instance::<Progress>().unwrap();
    assert_eq!(progress.coins, 9_000);
    assert_eq!(progress.pending_reward, Some(5));
    assert_eq!(progress.player_name, "Player");
}

#[test]
fn preferences_backend_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("prefs.json");
    let options = RegistryOptions {
        format: Format::Bincode,
        ..RegistryOptions::default()
    };

    {
        let backend = PreferencesBackend::open(&path).unwrap();
        let mut registry = SaveRegistry::with_options(backend, profile("main"), options);
        registry
            .update::<Progress, _>(|p| {
                p.level = 4;
                p.unlocked_skins.push("neon".to_string());
            })
            .unwrap();
    }

    let backend = PreferencesBackend::open(&path).unwrap();
    let mut registry = SaveRegistry::with_options(backend, profile("main"), options);
    let progress = registry.instance::<Progress>().unwrap();
    assert_eq!(progress.level, 4);
    assert_eq!(progress.unlocked_skins, vec!["classic", "neon"]);
}

#[test]
fn defaults_round_trip_in_every_format() {
    let temp_dir = TempDir::new().unwrap();

    for format in [Format::Json, Format::Bincode] {
        for backend in backends(&temp_dir) {
            let p = profile(format.as_ref());
            let bytes = format.encode(&Progress::default()).unwrap();
            backend.write(&p, "Progress", &bytes).unwrap();

            assert_eq!(
                stored::<Progress>(backend.as_ref(), &p, format),
                Progress::default(),
                "{} / {}",
                backend.name(),
                format
            );
        }
    }
}

#[test]
fn delete_profile_is_scoped_and_idempotent() {
    let temp_dir = TempDir::new().unwrap();

    for backend in backends(&temp_dir) {
        let (doomed, kept) = (profile("doomed"), profile("kept"));

        let mut registry = SaveRegistry::new(backend.clone(), kept.clone());
        registry.instance::<GameData>().unwrap();

        registry.switch_profile(doomed.clone()).unwrap();
        registry.instance::<GameData>().unwrap();
        registry.instance::<Progress>().unwrap();
        assert_eq!(
            registry.record_keys().unwrap(),
            vec!["GameData".to_string(), "Progress".to_string()]
        );

        registry.delete_profile().unwrap();
        registry.delete_profile().unwrap();

        assert!(!backend.exists(&doomed, "GameData").unwrap());
        assert!(!backend.exists(&doomed, "Progress").unwrap());
        assert!(backend.exists(&kept, "GameData").unwrap());
        assert_eq!(registry.loaded_count(), 0);
        assert_eq!(backend.list_profiles().unwrap(), vec![kept]);
    }
}

#[test]
fn same_key_in_two_profiles_never_collides() {
    let temp_dir = TempDir::new().unwrap();

    for backend in backends(&temp_dir) {
        let (a, b) = (profile("a"), profile("b"));
        let mut first = SaveRegistry::new(backend.clone(), a.clone());
        let mut second = SaveRegistry::new(backend.clone(), b.clone());

        first
            .update::<GameData, _>(|data| data.first_play = true)
            .unwrap();
        assert!(!second.instance::<GameData>().unwrap().first_play);

        second
            .update::<GameData, _>(|data| data.first_open = true)
            .unwrap();

        assert_eq!(
            stored::<GameData>(backend.as_ref(), &a, Format::Json),
            GameData {
                first_open: false,
                first_play: true
            }
        );
        assert_eq!(
            first.load::<GameData>().unwrap(),
            &GameData {
                first_open: false,
                first_play: true
            }
        );
    }
}
