use dotfield::audio::BandEnergies;
use dotfield::mapping::{
    AudioFeature, AudioMapping, MappingMode, MappingTable, resolve_live,
};
use dotfield::params::{ParamKey, PatternConfig, PatternFamily};

fn bands(bass: f32, mids: f32, treble: f32, overall: f32) -> BandEnergies {
    BandEnergies { bass, mids, treble, overall }
}

#[test]
fn additive_and_multiplicative_blending() {
    let add = AudioMapping::new(AudioFeature::Bass, MappingMode::Additive, 20.0);
    assert_eq!(add.apply(5.0, 0.25), 10.0);
    assert_eq!(add.apply(5.0, 0.0), 5.0);

    let mul = AudioMapping::new(AudioFeature::Overall, MappingMode::Multiplicative, 1.0);
    assert_eq!(mul.apply(2.0, 0.5), 3.0);
    assert_eq!(mul.apply(2.0, 0.0), 2.0);
}

#[test]
fn sensitivity_is_clamped_non_negative() {
    let m = AudioMapping::new(AudioFeature::Bass, MappingMode::Additive, -3.0);
    assert_eq!(m.sensitivity(), 0.0);
    let m = AudioMapping::new(AudioFeature::Bass, MappingMode::Additive, f32::NAN);
    assert_eq!(m.sensitivity(), 0.0);
    let m = AudioMapping::new(AudioFeature::Bass, MappingMode::Additive, 7.5);
    assert_eq!(m.sensitivity(), 7.5);
}

#[test]
fn bind_then_unbind_restores_base_output() {
    let base = PatternConfig::family_default(PatternFamily::Vortex);
    let loud = bands(0.0, 0.0, 0.0, 0.5);
    let mut table = MappingTable::new();

    table.bind(
        ParamKey::Speed,
        AudioMapping::new(AudioFeature::Overall, MappingMode::Multiplicative, 1.0),
    );
    let live = resolve_live(&base, &table, loud);
    assert_eq!(live.get(ParamKey::Speed), Some(1.5));

    table.unbind(ParamKey::Speed);
    let live = resolve_live(&base, &table, loud);
    // Unbound parameters track the base value exactly, not approximately.
    assert_eq!(live.get(ParamKey::Speed), base.get(ParamKey::Speed));
}

#[test]
fn resolve_never_mutates_the_base() {
    let base = PatternConfig::family_default(PatternFamily::Vortex);
    let snapshot = base;
    let mut table = MappingTable::new();
    table.bind(
        ParamKey::Distortion,
        AudioMapping::new(AudioFeature::Bass, MappingMode::Additive, 30.0),
    );

    // Resolving many frames in a row must not compound.
    for _ in 0..10 {
        let live = resolve_live(&base, &table, bands(1.0, 0.0, 0.0, 0.0));
        assert_eq!(live.get(ParamKey::Distortion), Some(5.0 + 30.0));
    }
    assert_eq!(base, snapshot);
}

#[test]
fn audio_readings_are_clamped_to_unit_range() {
    let base = PatternConfig::family_default(PatternFamily::Vortex);
    let mut table = MappingTable::new();
    table.bind(
        ParamKey::Speed,
        AudioMapping::new(AudioFeature::Bass, MappingMode::Additive, 10.0),
    );

    let live = resolve_live(&base, &table, bands(250.0, 0.0, 0.0, 0.0));
    assert_eq!(live.get(ParamKey::Speed), Some(11.0));

    let live = resolve_live(&base, &table, bands(-4.0, 0.0, 0.0, 0.0));
    assert_eq!(live.get(ParamKey::Speed), Some(1.0));
}

#[test]
fn foreign_bindings_pass_through_silently() {
    // OBase exists in the vortex vocabulary only.
    let base = PatternConfig::family_default(PatternFamily::Spiral);
    let mut table = MappingTable::new();
    table.bind(
        ParamKey::OBase,
        AudioMapping::new(AudioFeature::Treble, MappingMode::Additive, 50.0),
    );
    let live = resolve_live(&base, &table, bands(0.0, 0.0, 1.0, 1.0));
    assert_eq!(live, base);
}

#[test]
fn updates_on_unbound_keys_are_no_ops() {
    let mut table = MappingTable::new();
    table.update_sensitivity(ParamKey::Speed, 9.0);
    table.update_mode(ParamKey::Speed, MappingMode::Multiplicative);
    assert!(table.is_empty());
    assert!(table.get(ParamKey::Speed).is_none());
}

#[test]
fn updates_retune_existing_entries() {
    let mut table = MappingTable::new();
    table.bind(
        ParamKey::Scale,
        AudioMapping::new(AudioFeature::Mids, MappingMode::Additive, 2.0),
    );

    table.update_sensitivity(ParamKey::Scale, 4.0);
    table.update_mode(ParamKey::Scale, MappingMode::Multiplicative);
    let entry = table.get(ParamKey::Scale).expect("entry should survive");
    assert_eq!(entry.sensitivity(), 4.0);
    assert_eq!(entry.mode, MappingMode::Multiplicative);
    assert_eq!(entry.feature, AudioFeature::Mids);

    table.update_sensitivity(ParamKey::Scale, -1.0);
    assert_eq!(table.get(ParamKey::Scale).unwrap().sensitivity(), 0.0);
}

#[test]
fn bind_replaces_and_replace_all_swaps() {
    let mut table = MappingTable::new();
    table.bind(
        ParamKey::Speed,
        AudioMapping::new(AudioFeature::Bass, MappingMode::Additive, 1.0),
    );
    table.bind(
        ParamKey::Speed,
        AudioMapping::new(AudioFeature::Treble, MappingMode::Multiplicative, 2.0),
    );
    assert_eq!(table.len(), 1);
    assert_eq!(table.get(ParamKey::Speed).unwrap().feature, AudioFeature::Treble);

    let mut other = MappingTable::new();
    other.bind(
        ParamKey::Distortion,
        AudioMapping::new(AudioFeature::Mids, MappingMode::Additive, 8.0),
    );
    table.replace_all(other.clone());
    assert_eq!(table, other);
    assert!(table.get(ParamKey::Speed).is_none());
}

#[test]
fn randomized_tables_respect_family_and_mode_rules() {
    for family in [PatternFamily::Vortex, PatternFamily::Spiral] {
        for _ in 0..20 {
            let table = MappingTable::randomized(family);
            assert!((3..=5).contains(&table.len()), "len={}", table.len());
            for (key, mapping) in table.iter() {
                assert!(
                    family.keys().contains(&key),
                    "{family:?} table bound foreign key {key}"
                );
                match key {
                    ParamKey::Scale | ParamKey::Speed | ParamKey::DotSize => {
                        assert_eq!(mapping.mode, MappingMode::Multiplicative);
                        assert!((0.5..=2.0).contains(&mapping.sensitivity()));
                    }
                    _ => {
                        assert_eq!(mapping.mode, MappingMode::Additive);
                        assert!((5.0..=30.0).contains(&mapping.sensitivity()));
                    }
                }
            }
        }
    }
}

#[test]
fn feature_and_mode_names_round_trip() {
    for feature in dotfield::mapping::AUDIO_FEATURES {
        assert_eq!(AudioFeature::parse(feature.as_str()), Some(feature));
    }
    assert_eq!(AudioFeature::parse("subsonic"), None);
    for mode in [MappingMode::Additive, MappingMode::Multiplicative] {
        assert_eq!(MappingMode::parse(mode.as_str()), Some(mode));
    }
    assert_eq!(MappingMode::parse("exponential"), None);
}
