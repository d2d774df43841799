//! Superseded table shapes and values referenced only by migration steps.

/// `osm_quests` as of v3: `commit_message` (v2 only) is gone and the
/// `same_osm_quest` constraint is in place; `changes_source` arrives in v4.
pub const OSM_QUESTS_V3_COLUMNS: &[&str] = &[
    "quest_id",
    "quest_type",
    "element_id",
    "element_type",
    "quest_status",
    "tag_changes",
    "last_update",
];

pub const OSM_QUESTS_V3_CREATE: &str = r#"
    CREATE TABLE osm_quests (
        quest_id INTEGER PRIMARY KEY,
        quest_type varchar(255) NOT NULL,
        quest_status varchar(255) NOT NULL,
        tag_changes blob,
        last_update int NOT NULL,
        element_id int NOT NULL,
        element_type varchar(255) NOT NULL,
        CONSTRAINT same_osm_quest UNIQUE (quest_type, element_id, element_type),
        CONSTRAINT element_key FOREIGN KEY (element_type, element_id)
            REFERENCES elements_geometry (element_type, element_id)
    );
"#;

/// Column only present in the v2 `osm_quests` table
pub const OSM_QUESTS_COMMIT_MESSAGE: &str = "commit_message";

/// Combined note quest table, split into comment notes and hidden note ids in v21
pub const NOTE_QUESTS_TABLE: &str = "osm_notequests";

/// `osm_notequests` joined with `osm_notes`
pub const NOTE_QUESTS_FULL_VIEW: &str = "osm_notequests_full";

/// Columns read from the note quest view to build a comment note; the old
/// `changes` column holds the comment text.
pub const NOTE_QUESTS_COMMENT_COLUMNS: &[&str] = &[
    "note_id",
    "latitude",
    "longitude",
    "changes AS text",
    "image_paths",
];

pub const NOTE_QUEST_STATUS_ANSWERED: &str = "ANSWERED";
pub const NOTE_QUEST_STATUS_HIDDEN: &str = "HIDDEN";

/// Added to `osm_split_ways` in v15, dropped again in v21
pub const SPLIT_WAYS_QUEST_TYPES_ON_WAY: &str = "quest_types_on_way";

/// Quest type whose data was invalidated in v11
pub const SUSPECTED_ONEWAY_QUEST_TYPE: &str = "AddSuspectedOneway";

/// Quest status dropped in v19
pub const QUEST_STATUS_REVERT: &str = "REVERT";

/// Quest types removed from the application by v20
pub const RETIRED_QUEST_TYPES_V20: &[&str] = &[
    "DetailRoadSurface",
    "AddTrafficSignalsBlindFeatures",
    "AddAccessibleForPedestrians",
    "AddWheelChairAccessPublicTransport",
    "AddWheelChairAccessToilets",
];
