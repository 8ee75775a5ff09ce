use crate::error::{Error, Result};
use crate::tokenizer::tokenize_and_stem;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Raw study-space record as found in one input JSON file: one space, one
/// date, many rooms. Absent fields degrade to empty defaults rather than
/// failing the whole file.
#[derive(Debug, Default, Deserialize)]
pub struct SpaceRecord {
    #[serde(default)]
    pub space: SpaceDesc,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub rooms: Vec<RoomDesc>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SpaceDesc {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub hours: Option<Hours>,
    #[serde(default)]
    pub slot_minutes: Option<u32>,
    #[serde(default)]
    pub slot_count: Option<u32>,
    #[serde(default)]
    pub location: GeoPoint,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Hours {
    #[serde(default)]
    pub open: String,
    #[serde(default)]
    pub close: String,
}

#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RoomDesc {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub features: Vec<String>,
    /// One character per time slot, '1' = free, '0' = busy.
    #[serde(default)]
    pub slots_bitset: String,
}

/// Per-document metadata blob, written once to the docstore at build time and
/// read back for filtering at query time. Never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDoc {
    pub uid: String,
    pub space: SpaceDesc,
    pub date: String,
    pub room: RoomDesc,
}

/// One searchable document per room: the unique id, the stem set, and the
/// metadata blob destined for the docstore.
#[derive(Debug)]
pub struct RoomDoc {
    pub uid: String,
    pub terms: HashSet<String>,
    pub store: StoredDoc,
}

/// Parse one space file and expand it into one document per room.
///
/// A file that is not valid JSON for a [`SpaceRecord`] yields
/// [`Error::Parse`]; the caller skips the file and keeps building. Missing
/// fields within a structurally valid record are tolerated; the space id and
/// name fall back to the file stem so the uid stays non-degenerate.
pub fn extract_room_docs(path: &Path) -> Result<Vec<RoomDoc>> {
    let file = File::open(path).map_err(|e| Error::storage(path, e))?;
    let record: SpaceRecord = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| Error::Parse { path: path.to_path_buf(), source: e })?;
    Ok(room_docs_from_record(record, &file_stem(path)))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn room_docs_from_record(record: SpaceRecord, fallback_id: &str) -> Vec<RoomDoc> {
    let mut space = record.space;
    if space.id.is_empty() {
        space.id = fallback_id.to_string();
    }
    if space.name.is_empty() {
        space.name = fallback_id.to_string();
    }
    let date = record.date;

    let mut docs = Vec::with_capacity(record.rooms.len());
    for mut room in record.rooms {
        room.features = std::mem::take(&mut room.features)
            .into_iter()
            .map(|f| f.trim().to_lowercase())
            .filter(|f| !f.is_empty())
            .collect();

        let uid = format!("{}:{}:{}", space.id, room.id, date);

        let capacity_text = room
            .capacity
            .map(|c| c.to_string())
            .unwrap_or_default();
        let searchable_text = [
            space.name.as_str(),
            space.id.as_str(),
            date.as_str(),
            room.name.as_str(),
            room.id.as_str(),
            "capacity",
            capacity_text.as_str(),
            &room.features.join(" "),
        ]
        .join(" ");

        let terms = tokenize_and_stem(&searchable_text);

        docs.push(RoomDoc {
            uid: uid.clone(),
            terms,
            store: StoredDoc {
                uid,
                space: space.clone(),
                date: date.clone(),
                room,
            },
        });
    }
    docs
}
