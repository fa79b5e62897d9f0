#[cfg(test)]
mod tests {
    use crate::core::domain::{Band, FieldId};
    use crate::error::SchedulerError;
    use crate::parsing::catalog_parser::{parse_catalog_csv, read_catalog_csv};
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper to create a temp CSV file
    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", content).unwrap();
        temp_file
    }

    fn is_validation(err: &anyhow::Error) -> bool {
        err.downcast_ref::<SchedulerError>()
            .is_some_and(SchedulerError::is_validation)
    }

    /// Test parsing a catalog with every column present
    #[test]
    fn test_parse_catalog_full_columns() {
        let csv = "ID,RA,DEC,FILTER,TILING,PRIORITY,EXPTIME\n\
                   101,10.5,-20.25,g,1,1.0,90\n\
                   102,11.0,-21.0,r,2,2.5,120\n";
        let file = create_temp_csv(csv);

        let catalog = parse_catalog_csv(file.path(), 90.0).unwrap();
        assert_eq!(catalog.len(), 2);

        let second = catalog.get_by_id(FieldId::new(102)).unwrap();
        assert_eq!(second.band, Band::R);
        assert_eq!(second.tiling, 2);
        assert_eq!(second.priority, 2.5);
        assert_eq!(second.exposure.value(), 120.0);
        assert_eq!(second.ra.value(), 11.0);
        assert_eq!(second.dec.value(), -21.0);
    }

    /// Optional columns fall back to defaults; ids follow row order
    #[test]
    fn test_parse_catalog_defaults() {
        let csv = "ra,dec,filter,tiling\n10,-20,z,1\n20,-30,Y,3\n";
        let file = create_temp_csv(csv);

        let catalog = parse_catalog_csv(file.path(), 75.0).unwrap();
        let first = catalog.get(0).unwrap();
        assert_eq!(first.id, FieldId::new(0));
        assert_eq!(first.priority, 1.0);
        assert_eq!(first.exposure.value(), 75.0);
        assert_eq!(catalog.get(1).unwrap().band, Band::Y);
    }

    /// A HEX shared across bands and tilings is not an id; rows are numbered
    #[test]
    fn test_parse_catalog_repeated_hex() {
        let csv = "HEX,RA,DEC,FILTER,TILING,PRIORITY\n\
                   2042,54.0,-30.5,g,1,1\n\
                   2042,54.0,-30.5,r,1,1\n\
                   2042,54.3,-30.2,g,2,1\n";
        let file = create_temp_csv(csv);

        let catalog = parse_catalog_csv(file.path(), 90.0).unwrap();
        assert_eq!(catalog.len(), 3);
        let ids: Vec<i64> = catalog.iter().map(|field| field.id.value()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(catalog.get(1).unwrap().band, Band::R);
        assert_eq!(catalog.get(2).unwrap().tiling, 2);
    }

    /// Headers are case-insensitive
    #[test]
    fn test_parse_catalog_mixed_case_headers() {
        let csv = "Field_Id,Ra,Dec,Band,Tiling\n7,10,-20,i,1\n";
        let file = create_temp_csv(csv);

        let catalog = parse_catalog_csv(file.path(), 90.0).unwrap();
        assert!(catalog.get_by_id(FieldId::new(7)).is_some());
    }

    #[test]
    fn test_parse_catalog_rejects_out_of_range_dec() {
        let csv = "ra,dec,filter,tiling\n10,-95,g,1\n";
        let file = create_temp_csv(csv);

        let err = parse_catalog_csv(file.path(), 90.0).unwrap_err();
        assert!(is_validation(&err), "unexpected error: {:#}", err);
    }

    #[test]
    fn test_parse_catalog_rejects_duplicates() {
        let csv = "id,ra,dec,filter,tiling\n1,10,-20,g,1\n1,12,-20,g,1\n";
        let file = create_temp_csv(csv);
        let err = parse_catalog_csv(file.path(), 90.0).unwrap_err();
        assert!(is_validation(&err));
        assert!(format!("{:#}", err).contains("duplicate"));
    }

    #[test]
    fn test_parse_catalog_rejects_unknown_band() {
        let csv = "ra,dec,filter,tiling\n10,-20,q,1\n";
        let file = create_temp_csv(csv);
        let err = parse_catalog_csv(file.path(), 90.0).unwrap_err();
        assert!(is_validation(&err));
    }

    #[test]
    fn test_parse_catalog_missing_column() {
        let csv = "ra,dec,filter\n10,-20,g\n";
        let file = create_temp_csv(csv);
        let err = parse_catalog_csv(file.path(), 90.0).unwrap_err();
        assert!(format!("{:#}", err).contains("tiling"));
    }

    #[test]
    fn test_read_catalog_csv_dataframe() {
        let csv = "ra,dec,filter,tiling\n10,-20,g,1\n11,-20,g,1\n12,-20,g,1\n";
        let file = create_temp_csv(csv);
        let df = read_catalog_csv(file.path()).unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(df.width(), 4);
    }
}
