//! The migration step list
//!
//! One entry per historical schema change, in ascending version order. A step
//! for version V may assume every step below V already ran in the same chain.

use tracing::info;

use crate::database::core::{SchemaDefinitions, StatementExecutor, Value};
use crate::database::mapping::{
    insert_mapped, query_mapped, CommentNoteMapping, ElementGeometryMapping, ElementType,
};
use crate::database::migration::legacy;
use crate::database::migration::ops::{
    create_table, create_view, drop_table, drop_view, last_update_definition, rebuild_table,
    recreate_table, reshape_table, ColumnAddition,
};
use crate::database::migration::{AppliesWhen, MigrationContext, MigrationStep};
use crate::error::{Error, Result};

pub const MIGRATION_STEPS: &[MigrationStep] = &[
    MigrationStep {
        version: 3,
        description: "drop osm_quests.commit_message, add same_osm_quest constraint",
        applies_when: AppliesWhen::UpgradingFrom(2),
        action: v3_rebuild_osm_quests,
    },
    MigrationStep {
        version: 3,
        description: "create open_changesets",
        applies_when: AppliesWhen::Reaching,
        action: v3_open_changesets,
    },
    MigrationStep {
        version: 4,
        description: "add osm_quests.changes_source, recreate open_changesets",
        applies_when: AppliesWhen::Reaching,
        action: v4_changes_source,
    },
    MigrationStep {
        version: 5,
        description: "add osm_create_notes.quest_title",
        applies_when: AppliesWhen::Reaching,
        action: v5_create_note_quest_title,
    },
    MigrationStep {
        version: 6,
        description: "create road_names",
        applies_when: AppliesWhen::Reaching,
        action: v6_road_names,
    },
    MigrationStep {
        version: 7,
        description: "create osm_quests_undo",
        applies_when: AppliesWhen::Reaching,
        action: v7_undo_quests,
    },
    MigrationStep {
        version: 8,
        description: "add image_paths to note tables",
        applies_when: AppliesWhen::Reaching,
        action: v8_image_paths,
    },
    MigrationStep {
        version: 9,
        description: "create quest_visibility",
        applies_when: AppliesWhen::Reaching,
        action: v9_quest_visibility,
    },
    MigrationStep {
        version: 10,
        description: "create oneway_suspects_traffic_flow",
        applies_when: AppliesWhen::Reaching,
        action: v10_traffic_flow,
    },
    MigrationStep {
        version: 11,
        description: "discard suspected oneway data",
        applies_when: AppliesWhen::Reaching,
        action: v11_prune_suspected_oneway,
    },
    MigrationStep {
        version: 12,
        description: "create osm_split_ways, recreate osm_quests_undo",
        applies_when: AppliesWhen::Reaching,
        action: v12_split_ways,
    },
    MigrationStep {
        version: 13,
        description: "create achievements, links, new_achievements",
        applies_when: AppliesWhen::Reaching,
        action: v13_achievements,
    },
    MigrationStep {
        version: 14,
        description: "create country_statistics",
        applies_when: AppliesWhen::Reaching,
        action: v14_country_statistics,
    },
    MigrationStep {
        version: 15,
        description: "add osm_split_ways.quest_types_on_way",
        applies_when: AppliesWhen::Reaching,
        action: v15_quest_types_on_way,
    },
    MigrationStep {
        version: 16,
        description: "discard relations and relation quests",
        applies_when: AppliesWhen::Reaching,
        action: v16_prune_relations,
    },
    MigrationStep {
        version: 17,
        description: "add road_names.last_update",
        applies_when: AppliesWhen::Reaching,
        action: v17_road_names_last_update,
    },
    MigrationStep {
        version: 18,
        description: "clear downloaded_tiles",
        applies_when: AppliesWhen::Reaching,
        action: v18_clear_downloaded_tiles,
    },
    MigrationStep {
        version: 19,
        description: "create osm_delete_element, discard reverted quests",
        applies_when: AppliesWhen::Reaching,
        action: v19_delete_element,
    },
    MigrationStep {
        version: 20,
        description: "discard quests of retired quest types",
        applies_when: AppliesWhen::Reaching,
        action: v20_prune_retired_quest_types,
    },
    MigrationStep {
        version: 21,
        description: "geometry bounds, last_update columns, split note quests",
        applies_when: AppliesWhen::Reaching,
        action: v21_bounds_and_note_split,
    },
];

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

// commit_message was added in v2 and removed again in v3; SQLite cannot drop
// a column, so the table is rebuilt.
fn v3_rebuild_osm_quests(exec: &dyn StatementExecutor, _: &MigrationContext) -> Result<()> {
    let table = SchemaDefinitions::OSM_QUESTS.name;
    if !exec.has_column(table, legacy::OSM_QUESTS_COMMIT_MESSAGE)? {
        return Ok(());
    }
    rebuild_table(
        exec,
        table,
        legacy::OSM_QUESTS_V3_CREATE,
        legacy::OSM_QUESTS_V3_COLUMNS,
    )
}

fn v3_open_changesets(exec: &dyn StatementExecutor, _: &MigrationContext) -> Result<()> {
    create_table(exec, &SchemaDefinitions::OPEN_CHANGESETS)
}

fn v4_changes_source(exec: &dyn StatementExecutor, _: &MigrationContext) -> Result<()> {
    let quests = SchemaDefinitions::OSM_QUESTS.name;
    ColumnAddition {
        table: quests,
        column: "changes_source",
        definition: "varchar(255)",
    }
    .apply(exec)?;
    exec.execute_with_params(
        &format!(
            "UPDATE {} SET changes_source = ?1 WHERE changes_source ISNULL",
            quests
        ),
        &[text("survey")],
    )?;

    // The primary key changed. Open changesets are dropped rather than
    // converted; the server closes them after an hour anyway.
    recreate_table(exec, &SchemaDefinitions::OPEN_CHANGESETS)
}

fn v5_create_note_quest_title(exec: &dyn StatementExecutor, _: &MigrationContext) -> Result<()> {
    ColumnAddition {
        table: SchemaDefinitions::OSM_CREATE_NOTES.name,
        column: "quest_title",
        definition: "text",
    }
    .apply(exec)?;
    Ok(())
}

fn v6_road_names(exec: &dyn StatementExecutor, _: &MigrationContext) -> Result<()> {
    create_table(exec, &SchemaDefinitions::ROAD_NAMES)
}

fn v7_undo_quests(exec: &dyn StatementExecutor, _: &MigrationContext) -> Result<()> {
    create_table(exec, &SchemaDefinitions::OSM_QUESTS_UNDO)?;
    create_view(exec, &SchemaDefinitions::OSM_QUESTS_UNDO_FULL_VIEW)
}

fn v8_image_paths(exec: &dyn StatementExecutor, _: &MigrationContext) -> Result<()> {
    ColumnAddition {
        table: SchemaDefinitions::OSM_CREATE_NOTES.name,
        column: "image_paths",
        definition: "blob",
    }
    .apply(exec)?;
    if exec.table_exists(legacy::NOTE_QUESTS_TABLE)? {
        ColumnAddition {
            table: legacy::NOTE_QUESTS_TABLE,
            column: "image_paths",
            definition: "blob",
        }
        .apply(exec)?;
    }
    Ok(())
}

fn v9_quest_visibility(exec: &dyn StatementExecutor, _: &MigrationContext) -> Result<()> {
    create_table(exec, &SchemaDefinitions::QUEST_VISIBILITY)
}

fn v10_traffic_flow(exec: &dyn StatementExecutor, _: &MigrationContext) -> Result<()> {
    create_table(exec, &SchemaDefinitions::WAY_TRAFFIC_FLOW)
}

// All suspected oneway data was invalidated.
fn v11_prune_suspected_oneway(exec: &dyn StatementExecutor, _: &MigrationContext) -> Result<()> {
    let args = [text(legacy::SUSPECTED_ONEWAY_QUEST_TYPE)];
    let quests = exec.delete(
        SchemaDefinitions::OSM_QUESTS.name,
        Some("quest_type = ?1"),
        &args,
    )?;
    let undo = exec.delete(
        SchemaDefinitions::OSM_QUESTS_UNDO.name,
        Some("quest_type = ?1"),
        &args,
    )?;
    let flows = exec.delete(SchemaDefinitions::WAY_TRAFFIC_FLOW.name, None, &[])?;
    info!(
        "Discarded {} oneway quests, {} undo entries, {} traffic flows",
        quests, undo, flows
    );
    Ok(())
}

// The undo table changed shape slightly; its contents are not worth converting.
fn v12_split_ways(exec: &dyn StatementExecutor, _: &MigrationContext) -> Result<()> {
    create_table(exec, &SchemaDefinitions::OSM_SPLIT_WAYS)?;
    drop_view(exec, SchemaDefinitions::OSM_QUESTS_UNDO_FULL_VIEW.name)?;
    recreate_table(exec, &SchemaDefinitions::OSM_QUESTS_UNDO)?;
    create_view(exec, &SchemaDefinitions::OSM_QUESTS_UNDO_FULL_VIEW)
}

fn v13_achievements(exec: &dyn StatementExecutor, _: &MigrationContext) -> Result<()> {
    create_table(exec, &SchemaDefinitions::ACHIEVEMENTS)?;
    create_table(exec, &SchemaDefinitions::LINKS)?;
    create_table(exec, &SchemaDefinitions::NEW_ACHIEVEMENTS)
}

fn v14_country_statistics(exec: &dyn StatementExecutor, _: &MigrationContext) -> Result<()> {
    create_table(exec, &SchemaDefinitions::COUNTRY_STATISTICS)
}

fn v15_quest_types_on_way(exec: &dyn StatementExecutor, _: &MigrationContext) -> Result<()> {
    ColumnAddition {
        table: SchemaDefinitions::OSM_SPLIT_WAYS.name,
        column: legacy::SPLIT_WAYS_QUEST_TYPES_ON_WAY,
        definition: "text",
    }
    .apply(exec)?;
    Ok(())
}

// Relations downloaded by some builds may carry corrupt members, so every
// relation and every quest on a relation is discarded.
fn v16_prune_relations(exec: &dyn StatementExecutor, _: &MigrationContext) -> Result<()> {
    let args = [text(ElementType::Relation.as_str())];
    exec.delete(
        SchemaDefinitions::OSM_QUESTS.name,
        Some("element_type = ?1"),
        &args,
    )?;
    exec.delete(
        SchemaDefinitions::OSM_QUESTS_UNDO.name,
        Some("element_type = ?1"),
        &args,
    )?;
    exec.delete(SchemaDefinitions::OSM_RELATIONS.name, None, &[])?;
    Ok(())
}

fn v17_road_names_last_update(exec: &dyn StatementExecutor, ctx: &MigrationContext) -> Result<()> {
    ColumnAddition {
        table: SchemaDefinitions::ROAD_NAMES.name,
        column: "last_update",
        definition: &last_update_definition(ctx.now_millis),
    }
    .apply(exec)?;
    Ok(())
}

// Tile zoom changed; every downloaded tile record is meaningless now.
fn v18_clear_downloaded_tiles(exec: &dyn StatementExecutor, _: &MigrationContext) -> Result<()> {
    exec.delete(SchemaDefinitions::DOWNLOADED_TILES.name, None, &[])?;
    Ok(())
}

fn v19_delete_element(exec: &dyn StatementExecutor, _: &MigrationContext) -> Result<()> {
    create_table(exec, &SchemaDefinitions::OSM_DELETE_ELEMENT)?;
    exec.delete(
        SchemaDefinitions::OSM_QUESTS.name,
        Some("quest_status = ?1"),
        &[text(legacy::QUEST_STATUS_REVERT)],
    )?;
    Ok(())
}

fn v20_prune_retired_quest_types(exec: &dyn StatementExecutor, _: &MigrationContext) -> Result<()> {
    let placeholders: Vec<String> = (1..=legacy::RETIRED_QUEST_TYPES_V20.len())
        .map(|i| format!("?{}", i))
        .collect();
    let args: Vec<Value> = legacy::RETIRED_QUEST_TYPES_V20
        .iter()
        .map(|t| text(t))
        .collect();

    let removed = exec.delete(
        SchemaDefinitions::OSM_QUESTS.name,
        Some(&format!("quest_type IN ({})", placeholders.join(", "))),
        &args,
    )?;
    info!("Discarded {} quests of retired quest types", removed);
    Ok(())
}

fn v21_bounds_and_note_split(exec: &dyn StatementExecutor, ctx: &MigrationContext) -> Result<()> {
    // Recreating the geometry table fills in the new bounding box columns.
    let carried = reshape_table(
        exec,
        &SchemaDefinitions::ELEMENTS_GEOMETRY,
        &ElementGeometryMapping,
        ElementGeometryMapping::READ_COLUMNS,
    )?;
    info!("Carried {} element geometries into the new shape", carried);

    split_note_quests(exec)?;

    let last_update = last_update_definition(ctx.now_millis);
    for table in [
        &SchemaDefinitions::OSM_NOTES,
        &SchemaDefinitions::OSM_NODES,
        &SchemaDefinitions::OSM_WAYS,
        &SchemaDefinitions::OSM_RELATIONS,
    ] {
        ColumnAddition {
            table: table.name,
            column: "last_update",
            definition: &last_update,
        }
        .apply(exec)?;
    }

    // quest_types_on_way is no more
    if exec.has_column(
        SchemaDefinitions::OSM_SPLIT_WAYS.name,
        legacy::SPLIT_WAYS_QUEST_TYPES_ON_WAY,
    )? {
        recreate_table(exec, &SchemaDefinitions::OSM_SPLIT_WAYS)?;
    }
    Ok(())
}

/// Answered note quests become comment notes and hidden ones become hidden
/// note ids. Rows in any other status are dropped with the legacy table; an
/// answered quest whose note is gone fails the step.
fn split_note_quests(exec: &dyn StatementExecutor) -> Result<()> {
    create_table(exec, &SchemaDefinitions::OSM_COMMENT_NOTES)?;
    create_table(exec, &SchemaDefinitions::OSM_NOTEQUESTS_HIDDEN)?;

    if !exec.table_exists(legacy::NOTE_QUESTS_TABLE)? {
        drop_view(exec, legacy::NOTE_QUESTS_FULL_VIEW)?;
        return Ok(());
    }

    exec.transaction(&mut |tx| {
        let comment_notes = query_mapped(
            tx,
            &CommentNoteMapping,
            legacy::NOTE_QUESTS_FULL_VIEW,
            legacy::NOTE_QUESTS_COMMENT_COLUMNS,
            Some("quest_status = ?1"),
            &[text(legacy::NOTE_QUEST_STATUS_ANSWERED)],
        )?;
        let answered = tx
            .query(
                legacy::NOTE_QUESTS_TABLE,
                Some(&["note_id"]),
                Some("quest_status = ?1"),
                &[text(legacy::NOTE_QUEST_STATUS_ANSWERED)],
            )?
            .len();
        // the view joins osm_notes; an answered quest without its note cannot
        // become a comment note
        if answered != comment_notes.len() {
            return Err(Error::inconsistent(format!(
                "{} answered note quests have no note to attach the comment to",
                answered.saturating_sub(comment_notes.len())
            )));
        }
        let comments = insert_mapped(
            tx,
            &CommentNoteMapping,
            SchemaDefinitions::OSM_COMMENT_NOTES.name,
            &comment_notes,
        )?;

        let hidden_rows = tx.query(
            legacy::NOTE_QUESTS_TABLE,
            Some(&["note_id"]),
            Some("quest_status = ?1"),
            &[text(legacy::NOTE_QUEST_STATUS_HIDDEN)],
        )?;
        for row in &hidden_rows {
            tx.execute_with_params(
                &format!(
                    "INSERT INTO {} (note_id) VALUES (?1)",
                    SchemaDefinitions::OSM_NOTEQUESTS_HIDDEN.name
                ),
                &[Value::Integer(row.get_i64("note_id")?)],
            )?;
        }

        drop_view(tx, legacy::NOTE_QUESTS_FULL_VIEW)?;
        drop_table(tx, legacy::NOTE_QUESTS_TABLE)?;
        info!(
            "Split note quests into {} comment notes and {} hidden notes",
            comments,
            hidden_rows.len()
        );
        Ok(())
    })
}
