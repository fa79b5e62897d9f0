#[cfg(test)]
mod tests {
    use crate::core::domain::{Chronology, FieldId, NightClass};
    use crate::error::SchedulerError;
    use crate::io::loaders::{CatalogLoader, SourceFormat, WindowLoader};
    use crate::io::writers::{chronology_to_dataframe, write_chronology};
    use crate::scheduler::{Scheduler, SchedulerConfig};
    use crate::tactician::TacticianConfig;
    use polars::prelude::*;
    use std::io::Write;
    use std::path::Path;
    use tempfile::{NamedTempFile, TempDir};

    const CATALOG_CSV: &str = "id,ra,dec,filter,tiling\n\
                               1,127.5,-30.0,g,1\n\
                               2,128.0,-31.0,g,1\n";

    const WINDOWS_JSON: &str = r#"[{"start": "2017/02/08 04:00:00", "end": "2017/02/08 04:30:00"}]"#;

    fn create_temp_file(content: &str, suffix: &str) -> NamedTempFile {
        let mut temp_file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        write!(temp_file, "{}", content).unwrap();
        temp_file
    }

    fn scheduled_chronology() -> Chronology {
        let catalog_file = create_temp_file(CATALOG_CSV, ".csv");
        let catalog = CatalogLoader::load_from_file(catalog_file.path(), 90.0).unwrap();
        let windows = WindowLoader::load_from_json_str(WINDOWS_JSON).unwrap();

        let mut scheduler =
            Scheduler::new(catalog, TacticianConfig::default(), SchedulerConfig::default())
                .unwrap();
        scheduler.run(&windows).unwrap();
        scheduler.into_parts().1
    }

    #[test]
    fn test_source_format_detection() {
        assert_eq!(SourceFormat::from_path(Path::new("a.csv")).unwrap(), SourceFormat::Csv);
        assert_eq!(SourceFormat::from_path(Path::new("a.JSON")).unwrap(), SourceFormat::Json);
        assert!(SourceFormat::from_path(Path::new("a.parquet")).is_err());
        assert!(SourceFormat::from_path(Path::new("catalog")).is_err());
    }

    #[test]
    fn test_load_catalog_from_file() {
        let file = create_temp_file(CATALOG_CSV, ".csv");
        let catalog = CatalogLoader::load_from_file(file.path(), 90.0).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.get_by_id(FieldId::new(2)).is_some());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = CatalogLoader::load_from_file(Path::new("/nonexistent/fields.csv"), 90.0)
            .unwrap_err();
        assert!(matches!(err, SchedulerError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/fields.csv"));
    }

    #[test]
    fn test_catalog_validation_error_keeps_kind() {
        let file = create_temp_file("ra,dec,filter,tiling\n400,-20,g,1\n", ".csv");
        let err = CatalogLoader::load_from_file(file.path(), 90.0).unwrap_err();
        assert!(err.is_validation(), "unexpected error: {}", err);
    }

    #[test]
    fn test_load_windows_from_files() {
        let json = create_temp_file(WINDOWS_JSON, ".json");
        let windows = WindowLoader::load_from_file(json.path()).unwrap();
        assert_eq!(windows.len(), 1);

        let csv = create_temp_file(
            "start,end,classification\n2017/02/08 00:30:00,2017/02/08 08:30:00,second\n",
            ".csv",
        );
        let windows = WindowLoader::load_from_file(csv.path()).unwrap();
        assert_eq!(windows[0].classification(), NightClass::Second);
    }

    #[test]
    fn test_chronology_dataframe_columns() {
        let chronology = scheduled_chronology();
        assert!(!chronology.is_empty());

        let df = chronology_to_dataframe(&chronology).unwrap();
        assert_eq!(df.height(), chronology.len());
        let names = df.get_column_names();
        for expected in ["id", "time", "mjd", "filter", "airmass", "slew", "moon_phase"] {
            assert!(names.iter().any(|s| s.as_str() == expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_write_chronology_csv_and_json() {
        let chronology = scheduled_chronology();
        let dir = TempDir::new().unwrap();

        let csv_path = dir.path().join("chronology.csv");
        write_chronology(&chronology, &csv_path).unwrap();
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(csv_path.clone()))
            .unwrap()
            .finish()
            .unwrap();
        assert_eq!(df.height(), chronology.len());

        let json_path = dir.path().join("chronology.json");
        write_chronology(&chronology, &json_path).unwrap();
        let text = std::fs::read_to_string(&json_path).unwrap();
        let restored: Chronology = serde_json::from_str(&text).unwrap();
        assert_eq!(restored.len(), chronology.len());
        let ids: Vec<FieldId> = restored.iter().map(|e| e.field_id).collect();
        let expected: Vec<FieldId> = chronology.iter().map(|e| e.field_id).collect();
        assert_eq!(ids, expected);
        assert_eq!(restored.last().unwrap().time, chronology.last().unwrap().time);
    }
}
