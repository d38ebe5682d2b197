use ron::ser::PrettyConfig;
use serde::Serialize;
use std::io;
use std::io::Write;

pub fn write_as_ron<W: io::Write, S: Serialize>(mut writer: W, object: S) {
    let serialized = ron::ser::to_string_pretty(&object, PrettyConfig::default())
        .expect("Unable to serialize statistics");
    writer
        .write_all(serialized.as_bytes())
        .expect("Unable to write statistics");
}
