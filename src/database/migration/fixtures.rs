//! Stores as older builds left them, for exercising the upgrade chain.

use crate::database::core::{DatabaseConn, StatementExecutor};

const V2_SCHEMA: &str = r#"
    CREATE TABLE elements_geometry (
        element_type varchar(255) NOT NULL,
        element_id int NOT NULL,
        geometry_polylines blob,
        geometry_polygons blob,
        latitude double NOT NULL,
        longitude double NOT NULL,
        CONSTRAINT primary_key PRIMARY KEY (element_type, element_id)
    );
    CREATE TABLE osm_quests (
        quest_id INTEGER PRIMARY KEY,
        quest_type varchar(255) NOT NULL,
        quest_status varchar(255) NOT NULL,
        tag_changes blob,
        commit_message text,
        last_update int NOT NULL,
        element_id int NOT NULL,
        element_type varchar(255) NOT NULL,
        CONSTRAINT element_key FOREIGN KEY (element_type, element_id)
            REFERENCES elements_geometry (element_type, element_id)
    );
    CREATE VIEW osm_quests_full AS
        SELECT * FROM osm_quests
        INNER JOIN elements_geometry USING (element_type, element_id);
    CREATE TABLE osm_nodes (
        id int PRIMARY KEY,
        version int NOT NULL,
        latitude double NOT NULL,
        longitude double NOT NULL,
        tags blob
    );
    CREATE TABLE osm_ways (
        id int PRIMARY KEY,
        version int NOT NULL,
        tags blob,
        node_ids blob NOT NULL
    );
    CREATE TABLE osm_relations (
        id int PRIMARY KEY,
        version int NOT NULL,
        tags blob,
        members blob NOT NULL
    );
    CREATE TABLE osm_notes (
        id int PRIMARY KEY,
        latitude double NOT NULL,
        longitude double NOT NULL,
        created int NOT NULL,
        closed int,
        status varchar(255) NOT NULL,
        comments blob NOT NULL
    );
    CREATE TABLE osm_notequests (
        quest_id INTEGER PRIMARY KEY,
        note_id int UNIQUE NOT NULL,
        quest_status varchar(255) NOT NULL,
        changes text,
        last_update int NOT NULL
    );
    CREATE VIEW osm_notequests_full AS
        SELECT * FROM osm_notequests
        INNER JOIN osm_notes ON osm_notequests.note_id = osm_notes.id;
    CREATE TABLE osm_create_notes (
        create_id INTEGER PRIMARY KEY,
        latitude double NOT NULL,
        longitude double NOT NULL,
        element_type varchar(255),
        element_id int,
        text text NOT NULL
    );
    CREATE TABLE quest_statistics (
        quest_type varchar(255) PRIMARY KEY,
        succeeded int NOT NULL
    );
    CREATE TABLE downloaded_tiles (
        x int NOT NULL,
        y int NOT NULL,
        quest_type varchar(255) NOT NULL,
        date int NOT NULL,
        CONSTRAINT primary_key PRIMARY KEY (x, y, quest_type)
    );
"#;

const V2_DATA: &str = r#"
    INSERT INTO elements_geometry VALUES
        ('WAY', 1, '[[{"latitude":0.5,"longitude":3.0},{"latitude":1.5,"longitude":1.0}]]', NULL, 1.0, 2.0),
        ('NODE', 2, NULL, NULL, 10.0, 20.0),
        ('WAY', 3, NULL, '[[{"latitude":4.0,"longitude":4.0},{"latitude":5.0,"longitude":4.0},{"latitude":5.0,"longitude":5.0}]]', 4.5, 4.5);
    INSERT INTO osm_quests VALUES
        (1, 'AddRoadName', 'NEW', NULL, NULL, 0, 1, 'WAY'),
        (2, 'AddHousenumber', 'ANSWERED', X'01', 'add housenumber', 0, 2, 'NODE'),
        (3, 'AddBuildingLevels', 'HIDDEN', NULL, NULL, 0, 3, 'WAY');
    INSERT INTO osm_nodes VALUES (2, 1, 10.0, 20.0, NULL);
    INSERT INTO osm_ways VALUES (1, 1, NULL, X'00'), (3, 2, NULL, X'00');
    INSERT INTO osm_relations VALUES (9, 1, NULL, X'00');
    INSERT INTO osm_notes VALUES
        (100, 52.0, 13.0, 0, NULL, 'OPEN', X'00'),
        (101, 53.0, 14.0, 0, NULL, 'OPEN', X'00');
    INSERT INTO osm_notequests VALUES
        (1, 100, 'ANSWERED', 'hello', 0),
        (2, 101, 'HIDDEN', NULL, 0);
    INSERT INTO osm_create_notes VALUES (1, 1.0, 1.0, NULL, NULL, 'new note');
    INSERT INTO quest_statistics VALUES ('AddRoadName', 3);
    INSERT INTO downloaded_tiles VALUES (1, 1, 'AddRoadName', 0);
"#;

const V15_SCHEMA: &str = r#"
    CREATE TABLE elements_geometry (
        element_type varchar(255) NOT NULL,
        element_id int NOT NULL,
        geometry_polylines blob,
        geometry_polygons blob,
        latitude double NOT NULL,
        longitude double NOT NULL,
        CONSTRAINT primary_key PRIMARY KEY (element_type, element_id)
    );
    CREATE TABLE osm_quests (
        quest_id INTEGER PRIMARY KEY,
        quest_type varchar(255) NOT NULL,
        quest_status varchar(255) NOT NULL,
        tag_changes blob,
        last_update int NOT NULL,
        element_id int NOT NULL,
        element_type varchar(255) NOT NULL,
        changes_source varchar(255),
        CONSTRAINT same_osm_quest UNIQUE (quest_type, element_id, element_type),
        CONSTRAINT element_key FOREIGN KEY (element_type, element_id)
            REFERENCES elements_geometry (element_type, element_id)
    );
    CREATE VIEW osm_quests_full AS
        SELECT * FROM osm_quests
        INNER JOIN elements_geometry USING (element_type, element_id);
    CREATE TABLE osm_quests_undo (
        quest_id INTEGER PRIMARY KEY,
        quest_type varchar(255) NOT NULL,
        tag_changes blob NOT NULL,
        changes_source varchar(255) NOT NULL,
        element_id int NOT NULL,
        element_type varchar(255) NOT NULL,
        CONSTRAINT element_key FOREIGN KEY (element_type, element_id)
            REFERENCES elements_geometry (element_type, element_id)
    );
    CREATE VIEW osm_quests_full_undo AS
        SELECT * FROM osm_quests_undo
        INNER JOIN elements_geometry USING (element_type, element_id);
    CREATE TABLE osm_nodes (
        id int PRIMARY KEY,
        version int NOT NULL,
        latitude double NOT NULL,
        longitude double NOT NULL,
        tags blob
    );
    CREATE TABLE osm_ways (
        id int PRIMARY KEY,
        version int NOT NULL,
        tags blob,
        node_ids blob NOT NULL
    );
    CREATE TABLE osm_relations (
        id int PRIMARY KEY,
        version int NOT NULL,
        tags blob,
        members blob NOT NULL
    );
    CREATE TABLE osm_notes (
        id int PRIMARY KEY,
        latitude double NOT NULL,
        longitude double NOT NULL,
        created int NOT NULL,
        closed int,
        status varchar(255) NOT NULL,
        comments blob NOT NULL
    );
    CREATE TABLE osm_notequests (
        quest_id INTEGER PRIMARY KEY,
        note_id int UNIQUE NOT NULL,
        quest_status varchar(255) NOT NULL,
        changes text,
        last_update int NOT NULL,
        image_paths blob
    );
    CREATE VIEW osm_notequests_full AS
        SELECT * FROM osm_notequests
        INNER JOIN osm_notes ON osm_notequests.note_id = osm_notes.id;
    CREATE TABLE osm_create_notes (
        create_id INTEGER PRIMARY KEY,
        latitude double NOT NULL,
        longitude double NOT NULL,
        element_type varchar(255),
        element_id int,
        text text NOT NULL,
        quest_title text,
        image_paths blob
    );
    CREATE TABLE quest_statistics (
        quest_type varchar(255) PRIMARY KEY,
        succeeded int NOT NULL
    );
    CREATE TABLE country_statistics (
        country_code varchar(255) PRIMARY KEY,
        succeeded int NOT NULL,
        rank int
    );
    CREATE TABLE achievements (
        achievement varchar(255) PRIMARY KEY,
        level int NOT NULL
    );
    CREATE TABLE links (
        link varchar(255) PRIMARY KEY
    );
    CREATE TABLE new_achievements (
        achievement varchar(255) NOT NULL,
        level int NOT NULL,
        CONSTRAINT primary_key PRIMARY KEY (achievement, level)
    );
    CREATE TABLE downloaded_tiles (
        x int NOT NULL,
        y int NOT NULL,
        quest_type varchar(255) NOT NULL,
        date int NOT NULL,
        CONSTRAINT primary_key PRIMARY KEY (x, y, quest_type)
    );
    CREATE TABLE open_changesets (
        quest_type varchar(255),
        source varchar(255),
        changeset_id int NOT NULL,
        CONSTRAINT primary_key PRIMARY KEY (quest_type, source)
    );
    CREATE TABLE quest_visibility (
        quest_type varchar(255) PRIMARY KEY,
        visibility int NOT NULL
    );
    CREATE TABLE osm_split_ways (
        quest_id INTEGER PRIMARY KEY,
        quest_type varchar(255) NOT NULL,
        way_id int NOT NULL,
        splits blob NOT NULL,
        source varchar(255) NOT NULL,
        quest_types_on_way text
    );
    CREATE TABLE road_names (
        way_id int PRIMARY KEY,
        names blob NOT NULL,
        geometry blob NOT NULL,
        min_latitude double NOT NULL,
        min_longitude double NOT NULL,
        max_latitude double NOT NULL,
        max_longitude double NOT NULL
    );
    CREATE TABLE oneway_suspects_traffic_flow (
        way_id int PRIMARY KEY,
        is_forward int NOT NULL
    );
"#;

const V15_DATA: &str = r#"
    INSERT INTO elements_geometry VALUES
        ('WAY', 1, '[[{"latitude":0.5,"longitude":3.0},{"latitude":1.5,"longitude":1.0}]]', NULL, 1.0, 2.0),
        ('NODE', 2, NULL, NULL, 10.0, 20.0),
        ('WAY', 3, '[[{"latitude":2.0,"longitude":2.0},{"latitude":2.5,"longitude":2.5}]]', NULL, 2.2, 2.2),
        ('WAY', 4, '[[{"latitude":3.0,"longitude":3.0},{"latitude":3.5,"longitude":3.5}]]', NULL, 3.2, 3.2),
        ('RELATION', 5, NULL, '[[{"latitude":6.0,"longitude":6.0},{"latitude":7.0,"longitude":6.0},{"latitude":7.0,"longitude":7.0}]]', 6.5, 6.5),
        ('NODE', 6, NULL, NULL, 11.0, 21.0);
    INSERT INTO osm_quests (quest_id, quest_type, quest_status, tag_changes, last_update, element_id, element_type, changes_source) VALUES
        (1, 'AddRoadName', 'NEW', NULL, 0, 1, 'WAY', NULL),
        (2, 'AddRoadName', 'ANSWERED', X'01', 0, 3, 'WAY', 'survey'),
        (3, 'AddSuspectedOneway', 'NEW', NULL, 0, 4, 'WAY', NULL),
        (4, 'AddOpeningHours', 'ANSWERED', X'01', 0, 5, 'RELATION', 'survey'),
        (5, 'AddHousenumber', 'REVERT', X'01', 0, 2, 'NODE', 'survey'),
        (6, 'DetailRoadSurface', 'NEW', NULL, 0, 4, 'WAY', NULL),
        (7, 'AddWheelChairAccessToilets', 'NEW', NULL, 0, 6, 'NODE', NULL);
    INSERT INTO osm_quests_undo VALUES
        (1, 'AddSuspectedOneway', X'01', 'survey', 4, 'WAY'),
        (2, 'AddMaxSpeed', X'01', 'survey', 5, 'RELATION'),
        (3, 'AddRoadName', X'01', 'survey', 1, 'WAY');
    INSERT INTO osm_nodes VALUES (2, 1, 10.0, 20.0, NULL), (6, 1, 11.0, 21.0, NULL);
    INSERT INTO osm_ways VALUES (1, 1, NULL, X'00'), (3, 1, NULL, X'00'), (4, 3, NULL, X'00');
    INSERT INTO osm_relations VALUES (5, 2, NULL, X'00');
    INSERT INTO osm_notes VALUES
        (100, 52.0, 13.0, 0, NULL, 'OPEN', X'00'),
        (101, 53.0, 14.0, 0, NULL, 'OPEN', X'00'),
        (102, 54.0, 15.0, 0, NULL, 'OPEN', X'00');
    INSERT INTO osm_notequests VALUES
        (1, 100, 'ANSWERED', 'the shop is closed', 0, '["/img/1.jpg"]'),
        (2, 101, 'HIDDEN', NULL, 0, NULL),
        (3, 102, 'NEW', NULL, 0, NULL);
    INSERT INTO osm_create_notes VALUES (1, 1.0, 1.0, 'NODE', 2, 'new note', 'What is this?', NULL);
    INSERT INTO quest_statistics VALUES ('AddRoadName', 3);
    INSERT INTO country_statistics VALUES ('DE', 3, 120);
    INSERT INTO achievements VALUES ('Surveyor', 2);
    INSERT INTO links VALUES ('wiki');
    INSERT INTO downloaded_tiles VALUES (1, 1, 'AddRoadName', 0), (1, 2, 'AddRoadName', 0);
    INSERT INTO open_changesets VALUES ('AddRoadName', 'survey', 7);
    INSERT INTO quest_visibility VALUES ('AddRoadName', 1);
    INSERT INTO osm_split_ways VALUES (1, 'AddRoadName', 1, X'00', 'survey', 'AddRoadName');
    INSERT INTO road_names VALUES (1, X'00', X'00', 0.5, 1.0, 1.5, 3.0);
    INSERT INTO oneway_suspects_traffic_flow VALUES (4, 1);
"#;

fn store(schema: &str, data: &str, version: u32) -> DatabaseConn {
    let db = DatabaseConn::open_in_memory().unwrap();
    db.set_foreign_keys(false).unwrap();
    db.conn.execute_batch(schema).unwrap();
    db.conn.execute_batch(data).unwrap();
    db.set_schema_version(version).unwrap();
    db
}

/// A v2 store: `osm_quests` still carries `commit_message`, notes and quests
/// on notes share `osm_notequests`, no `last_update` on map data.
pub fn v2_store() -> DatabaseConn {
    store(V2_SCHEMA, V2_DATA, 2)
}

/// A v15 store with rows every later step touches.
pub fn v15_store() -> DatabaseConn {
    store(V15_SCHEMA, V15_DATA, 15)
}
