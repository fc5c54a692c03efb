use std::path::Path;

use boofar_core::{
    CollisionPolicy, GroupingOrder, OrganizeConfig, TagKey, TagMap, TagSnapshot, tag_segment,
};
use strum::IntoEnumIterator;

#[test]
fn test_only_artist_album_genre_group() {
    let groupable: Vec<TagKey> = TagKey::iter().filter(|k| k.is_groupable()).collect();
    assert_eq!(groupable, vec![TagKey::Artist, TagKey::Album, TagKey::Genre]);
}

#[test]
fn test_every_key_has_a_fallback() {
    for key in TagKey::iter() {
        assert!(!key.fallback_label().is_empty());
        assert_eq!(tag_segment(None, key), key.fallback_label());
    }
}

#[test]
fn test_grouping_order_is_significant() {
    let tags = TagMap::new()
        .with(TagKey::Artist, "X")
        .with(TagKey::Album, "Y")
        .with(TagKey::Genre, "Rock");

    let a = TagSnapshot::capture(&tags, &GroupingOrder::new([TagKey::Artist, TagKey::Genre]).unwrap());
    let b = TagSnapshot::capture(&tags, &GroupingOrder::new([TagKey::Genre, TagKey::Artist]).unwrap());

    assert_eq!(a.segments().collect::<Vec<_>>(), vec!["X", "Rock"]);
    assert_eq!(b.segments().collect::<Vec<_>>(), vec!["Rock", "X"]);
}

#[test]
fn test_snapshot_capture_is_pure() {
    let tags = TagMap::new().with(TagKey::Genre, "Rock/Indie");
    let order = GroupingOrder::default();

    assert_eq!(
        TagSnapshot::capture(&tags, &order),
        TagSnapshot::capture(&tags, &order)
    );
}

#[test]
fn test_hostile_tag_values_stay_single_segment() {
    for value in ["Rock/Indie", r"..\..\etc", "../up", "a/b/c/d", "/"] {
        let segment = tag_segment(Some(value), TagKey::Genre);
        assert_eq!(
            Path::new(&segment).components().count(),
            1,
            "{value:?} produced {segment:?}"
        );
    }
}

#[test]
fn test_grouping_display() {
    assert_eq!(GroupingOrder::default().to_string(), "GENRE > ARTIST > ALBUM");
}

#[test]
fn test_config_roundtrip_keeps_policy() {
    let config = OrganizeConfig::builder()
        .source("/music")
        .collision(CollisionPolicy::Overwrite)
        .prune_empty_dirs(false)
        .build()
        .unwrap();

    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains("\"overwrite\""));

    let back: OrganizeConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back.collision, CollisionPolicy::Overwrite);
    assert!(!back.prune_empty_dirs);
    assert_eq!(back.grouping, config.grouping);
}
