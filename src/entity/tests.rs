use std::cell::{
    Cell,
    RefCell,
};
use std::rc::Rc;

use hashbrown::{
    HashMap,
    HashSet,
};
use rstest::*;

use super::*;
use crate::data_structs::{
    Accession,
    ManifestRegistry,
    Section,
    CHARACTERISTICS_RAW_KEY,
};
use crate::error::Error;
use crate::io::idat::ChannelFiles;

const GSM_A: &str = "\
^SAMPLE = GSM1000001
!Sample_title = whole blood 1
!Sample_geo_accession = GSM1000001
!Sample_status = Public on Jan 01 2020
!Sample_series_id = GSE500001
!Sample_series_id = GSE500002
!Sample_platform_id = GPL13534
!Sample_characteristics_ch1 = tissue: whole blood
!Sample_characteristics_ch1 = age: 67
!Sample_characteristics_ch1 = smoker
!Sample_supplementary_file = ftp://geo/GSM1000001_200001_R01C01_Grn.idat.gz
!Sample_supplementary_file = ftp://geo/GSM1000001_200001_R01C01_Red.idat.gz
!Sample_data_row_count = 0
";

const GSM_B: &str = "\
^SAMPLE = GSM1000002
!Sample_title = whole blood 2
!Sample_geo_accession = GSM1000002
!Sample_series_id = GSE500001
!Sample_platform_id = GPL13534
!Sample_characteristics_ch1 = tissue: whole blood
!Sample_data_row_count = 485577
!sample_table_begin
ID_REF\tVALUE\tDetection Pval
cg00000029\t0.25\t0.001
cg00000108\tnull\t0.9
cg00000109\t0.75\t0.001
!sample_table_end
";

const GSM_C: &str = "\
^SAMPLE = GSM1000003
!Sample_title = whole blood 3
!Sample_geo_accession = GSM1000003
!Sample_series_id = GSE500003
!Sample_platform_id = GPL13534
!Sample_data_row_count = 0
";

const GSE_ONE: &str = "\
^SERIES = GSE500001
!Series_title = Blood methylation
!Series_geo_accession = GSE500001
!Series_sample_id = GSM1000002
!Series_sample_id = GSM1000001
";

const GSE_TWO: &str = "\
^SERIES = GSE500002
!Series_title = Smoking
!Series_geo_accession = GSE500002
!Series_contributor = Doe,,J
!Series_contributor = Roe,,R
!Series_sample_id = GSM1000001
";

const GSE_THREE: &str = "\
^SERIES = GSE500003
!Series_title = Mixed availability
!Series_geo_accession = GSE500003
!Series_sample_id = GSM1000001
!Series_sample_id = GSM1000002
!Series_sample_id = GSM1000003
";

fn acc(id: &str) -> Accession {
    Accession::new(id).unwrap()
}

/// Counts card requests and fails on demand.
#[derive(Default)]
struct CountingSource {
    inner:         SoftTextSource,
    sample_calls:  RefCell<HashMap<Accession, usize>>,
    series_calls:  Cell<usize>,
    table_calls:   Cell<usize>,
    fail_next:     RefCell<HashSet<Accession>>,
}

impl CountingSource {
    fn sample_calls(
        &self,
        accession: &str,
    ) -> usize {
        self.sample_calls
            .borrow()
            .get(&acc(accession))
            .copied()
            .unwrap_or(0)
    }
}

impl MetadataSource for CountingSource {
    fn sample_card(
        &self,
        accession: &Accession,
    ) -> anyhow::Result<SampleCard> {
        *self
            .sample_calls
            .borrow_mut()
            .entry(accession.clone())
            .or_default() += 1;
        if self.fail_next.borrow_mut().remove(accession) {
            anyhow::bail!("connection reset");
        }
        self.inner.sample_card(accession)
    }

    fn series_card(
        &self,
        accession: &Accession,
    ) -> anyhow::Result<SeriesCard> {
        self.series_calls.set(self.series_calls.get() + 1);
        self.inner.series_card(accession)
    }

    fn sample_table(
        &self,
        accession: &Accession,
    ) -> anyhow::Result<String> {
        self.table_calls.set(self.table_calls.get() + 1);
        self.inner.sample_table(accession)
    }
}

/// Records channel file requests and never has any files.
#[derive(Default)]
struct NoFiles {
    calls: Cell<usize>,
}

impl ChannelFileSource for NoFiles {
    fn channel_files(
        &self,
        accession: &Accession,
    ) -> anyhow::Result<ChannelFiles> {
        self.calls.set(self.calls.get() + 1);
        anyhow::bail!("{} not downloaded", accession)
    }
}

#[fixture]
fn source() -> CountingSource {
    let inner = SoftTextSource::new()
        .with_card("GSM1000001", GSM_A)
        .and_then(|s| s.with_card("GSM1000002", GSM_B))
        .and_then(|s| s.with_card("GSE500001", GSE_ONE))
        .and_then(|s| s.with_card("GSM1000003", GSM_C))
        .and_then(|s| s.with_card("GSE500002", GSE_TWO))
        .and_then(|s| s.with_card("GSE500003", GSE_THREE))
        .unwrap();
    CountingSource {
        inner,
        ..Default::default()
    }
}

mod cache_tests {
    use super::*;

    #[test]
    fn factory_runs_once() {
        let mut cache: EntityCache<String> = EntityCache::new();
        let calls = Cell::new(0);
        let id = acc("GSM1");

        let first = cache
            .get_or_create(&id, || {
                calls.set(calls.get() + 1);
                Ok("built".to_string())
            })
            .unwrap();
        let second = cache
            .get_or_create(&id, || {
                calls.set(calls.get() + 1);
                Ok("rebuilt".to_string())
            })
            .unwrap();

        assert_eq!(calls.get(), 1);
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(second.borrow().as_str(), "built");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failed_factory_leaves_no_entry() {
        let mut cache: EntityCache<u32> = EntityCache::new();
        let id = acc("GSE7");

        let result = cache.get_or_create(&id, || Err(Error::Config("boom".into())));
        assert!(matches!(result, Err(Error::Config(_))));
        assert!(!cache.contains(&id));
        assert!(cache.is_empty());

        let handle = cache.get_or_create(&id, || Ok(7)).unwrap();
        assert_eq!(*handle.borrow(), 7);
        assert!(Rc::ptr_eq(&handle, &cache.get(&id).unwrap()));
    }

    #[test]
    fn accessions_keep_insertion_order() {
        let mut cache: EntityCache<()> = EntityCache::new();
        for id in ["GSM3", "GSM1", "GSM2"] {
            cache.get_or_create(&acc(id), || Ok(())).unwrap();
        }
        let order: Vec<&str> = cache.accessions().map(Accession::as_str).collect();
        assert_eq!(order, ["GSM3", "GSM1", "GSM2"]);
        assert!(cache.get(&acc("GSM4")).is_none());
    }
}

mod card_tests {
    use super::*;
    use crate::io::soft::{
        parse_sample_soft,
        parse_series_soft,
    };

    #[test]
    fn sample_card_fields() {
        let card = parse_sample_soft(&acc("GSM1000001"), GSM_A).unwrap();
        assert_eq!(card.info().first("title"), Some("whole blood 1"));
        assert_eq!(card.series(), Some(acc("GSE500001")));
        assert_eq!(card.platform(), Some("GPL13534"));
        assert_eq!(card.data_availability(), DataAvailability::Idat);
        assert_eq!(
            card.characteristics_text().as_deref(),
            Some("tissue: whole blood\nage: 67\nsmoker")
        );
        assert!(!card.info().contains("SAMPLE"));
    }

    #[test]
    fn table_only_sample() {
        let card = parse_sample_soft(&acc("GSM1000002"), GSM_B).unwrap();
        assert_eq!(card.data_availability(), DataAvailability::Table);
        assert!(!card.info().keys().any(|key| key.contains("ID_REF")));
    }

    #[test]
    fn sample_without_data() {
        let card = parse_sample_soft(&acc("GSM1000003"), GSM_C).unwrap();
        assert_eq!(card.data_availability(), DataAvailability::None);
    }

    #[test]
    fn sample_card_for_other_accession() {
        let result = parse_sample_soft(&acc("GSM1000002"), GSM_A);
        assert!(matches!(result, Err(Error::InvalidAccession(_))));
    }

    #[test]
    fn series_card_sample_order() {
        let card = parse_series_soft(&acc("GSE500002"), GSE_TWO).unwrap();
        assert_eq!(card.samples(), &[acc("GSM1000001")]);
        assert_eq!(card.info().values("contributor"), ["Doe,,J", "Roe,,R"]);
        assert!(!card.info().contains("sample_id"));

        let card = parse_series_soft(&acc("GSE500001"), GSE_ONE).unwrap();
        assert_eq!(card.samples(), &[acc("GSM1000002"), acc("GSM1000001")]);
    }
}

mod session_tests {
    use super::*;

    fn session(source: &CountingSource) -> GeoSession<&CountingSource, NoFiles> {
        GeoSession::new(source, NoFiles::default(), ManifestRegistry::default())
    }

    #[rstest]
    fn metadata_phase_only(source: CountingSource) {
        let files = NoFiles::default();
        let mut session =
            GeoSession::new(&source, &files, ManifestRegistry::default());
        let gsm = session.gsm(&acc("GSM1000001")).unwrap();
        assert_eq!(files.calls.get(), 0);

        let gsm = gsm.borrow();
        assert!(!gsm.is_loaded());
        assert_eq!(gsm.data(), &GsmData::MetadataOnly);
        assert_eq!(gsm.gse(), Some(&acc("GSE500001")));
        assert_eq!(gsm.characteristics().get("age"), Some("67"));
        assert_eq!(gsm.characteristics().get(CHARACTERISTICS_RAW_KEY), Some("smoker"));
        assert_eq!(gsm.characteristics().warnings().len(), 1);
        assert!(gsm.to_string().ends_with("metadata only"));
    }

    #[rstest]
    fn metadata_fetched_once(source: CountingSource) {
        let mut session = session(&source);
        let first = session.gsm(&acc("GSM1000001")).unwrap();
        let second = session.gsm(&acc("gsm1000001")).unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(source.sample_calls("GSM1000001"), 1);
    }

    #[rstest]
    fn collaborator_failure_is_retried(source: CountingSource) {
        source.fail_next.borrow_mut().insert(acc("GSM1000001"));
        let mut session = session(&source);

        let err = session.gsm(&acc("GSM1000001")).unwrap_err();
        assert!(matches!(err, Error::Source { .. }));
        assert!(!session.gsm_cache().contains(&acc("GSM1000001")));

        session.gsm(&acc("GSM1000001")).unwrap();
        assert_eq!(source.sample_calls("GSM1000001"), 2);
    }

    #[rstest]
    fn series_resolves_samples_in_order(source: CountingSource) {
        let mut session = session(&source);
        let gse = session.gse(&acc("GSE500001")).unwrap();
        let gse = gse.borrow();

        let order: Vec<&str> = gse.accessions().map(Accession::as_str).collect();
        assert_eq!(order, ["GSM1000002", "GSM1000001"]);
        assert_eq!(gse.len(), 2);
        assert_eq!(gse.info().first("title"), Some("Blood methylation"));
    }

    #[rstest]
    fn shared_sample_across_series(source: CountingSource) {
        let mut session = session(&source);
        let one = session.gse(&acc("GSE500001")).unwrap();
        let two = session.gse(&acc("GSE500002")).unwrap();

        let from_one = one.borrow().get(&acc("GSM1000001")).unwrap();
        let from_two = two.borrow().get(&acc("GSM1000001")).unwrap();
        assert!(Rc::ptr_eq(&from_one, &from_two));
        assert_eq!(source.sample_calls("GSM1000001"), 1);
        assert_eq!(session.gsm_cache().len(), 2);

        session.gse(&acc("GSE500001")).unwrap();
        assert_eq!(source.series_calls.get(), 2);
    }

    #[rstest]
    fn unknown_sample_in_series(source: CountingSource) {
        let mut session = session(&source);
        let gse = session.gse(&acc("GSE500002")).unwrap();
        let err = gse.borrow().get(&acc("GSM1000002")).unwrap_err();
        assert!(matches!(err, Error::UnknownSample { .. }));
    }

    #[rstest]
    fn wrong_accession_kind(source: CountingSource) {
        let mut session = session(&source);
        assert!(matches!(
            session.gsm(&acc("GSE500001")),
            Err(Error::InvalidAccession(_))
        ));
        assert!(matches!(
            session.gse(&acc("GSM1000001")),
            Err(Error::InvalidAccession(_))
        ));
    }

    #[rstest]
    fn failed_data_phase_keeps_metadata(source: CountingSource) {
        let mut session = session(&source);
        let err = session.load_gsm_data(&acc("GSM1000001")).unwrap_err();
        assert!(matches!(err, Error::Source { .. }));

        let gsm = session.gsm(&acc("GSM1000001")).unwrap();
        assert!(!gsm.borrow().is_loaded());
        assert_eq!(source.sample_calls("GSM1000001"), 1);
    }

    #[rstest]
    fn series_data_failures_recorded(source: CountingSource) {
        let mut session = session(&source);
        let gse = session.load_gse_data(&acc("GSE500003")).unwrap();
        let gse = gse.borrow();

        assert_eq!(gse.no_data(), &[acc("GSM1000001"), acc("GSM1000003")]);
        assert!(gse.to_string().contains("1 with data, 2 without"));
        assert_eq!(session.files().calls.get(), 1);
    }

    #[rstest]
    fn no_data_fails_before_collaborators(source: CountingSource) {
        let files = NoFiles::default();
        let mut session = GeoSession::new(&source, &files, ManifestRegistry::default());

        let err = session.load_gsm_data(&acc("GSM1000003")).unwrap_err();
        assert!(matches!(&err, Error::NoData(accession) if accession == &acc("GSM1000003")));
        assert_eq!(files.calls.get(), 0);
        assert_eq!(source.table_calls.get(), 0);
        assert!(!session.gsm(&acc("GSM1000003")).unwrap().borrow().is_loaded());
    }

    #[rstest]
    fn processed_table_sample(source: CountingSource) {
        let files = NoFiles::default();
        let mut session = GeoSession::new(&source, &files, ManifestRegistry::default());

        let gsm = session.load_gsm_data(&acc("GSM1000002")).unwrap();
        assert_eq!(files.calls.get(), 0);
        {
            let gsm = gsm.borrow();
            let table = gsm.betas().unwrap();
            assert_eq!(table.array_type(), "450k");
            assert_eq!(table.len(), 2);
            assert_eq!(table.beta("cg00000029"), Some(0.25));
            assert_eq!(table.beta("cg00000109"), Some(0.75));
            assert_eq!(table.dropped_probes(), 1);
        }

        session.load_gsm_data(&acc("GSM1000002")).unwrap();
        assert_eq!(source.table_calls.get(), 1);
    }

    #[test]
    fn processed_table_without_header() {
        let bare = SoftTextSource::new()
            .with_card("GSM1000002", GSM_B.replace("ID_REF", "PROBE"))
            .unwrap();
        let mut session = GeoSession::new(bare, NoFiles::default(), ManifestRegistry::default());

        let err = session.load_gsm_data(&acc("GSM1000002")).unwrap_err();
        assert!(matches!(&err, Error::Entity { source, .. } if matches!(**source, Error::Table(_))));
        assert!(!session.gsm(&acc("GSM1000002")).unwrap().borrow().is_loaded());
    }

    #[rstest]
    fn series_matrix_attached_by_accession_or_title(source: CountingSource) -> anyhow::Result<()> {
        let mut session = session(&source);
        let csv = "ID_REF,whole blood 1,GSM1000009\ncg00000029,0.4,0.1\ncg00000108,0.6,0.2\n";
        let matrix = crate::io::read_series_matrix(std::io::Cursor::new(csv.as_bytes().to_vec()))?;

        let gse = session.attach_series_matrix(&acc("GSE500003"), &matrix)?;
        let gse = gse.borrow();
        assert_eq!(gse.no_data(), &[acc("GSM1000002"), acc("GSM1000003")]);

        let by_title = gse.get(&acc("GSM1000001"))?;
        assert_eq!(by_title.borrow().betas().unwrap().beta("cg00000108"), Some(0.6));
        assert_eq!(session.files().calls.get(), 0);

        let frame = gse.to_frame(Section::Data)?;
        assert_eq!(frame.shape(), (2, 2));
        Ok(())
    }

    #[rstest]
    fn series_matrix_keeps_loaded_data(source: CountingSource) -> anyhow::Result<()> {
        let mut session = session(&source);
        session.load_gsm_data(&acc("GSM1000002"))?;
        let csv = "probe,GSM1000002\ncg00000029,0.99\n";
        let matrix = crate::io::read_series_matrix(std::io::Cursor::new(csv.as_bytes().to_vec()))?;

        let gse = session.attach_series_matrix(&acc("GSE500001"), &matrix)?;
        let gsm = gse.borrow().get(&acc("GSM1000002"))?;
        assert_eq!(gsm.borrow().betas().unwrap().beta("cg00000029"), Some(0.25));
        assert_eq!(gse.borrow().no_data(), &[acc("GSM1000001")]);
        Ok(())
    }

    #[rstest]
    fn info_frame(source: CountingSource) -> anyhow::Result<()> {
        let mut session = session(&source);
        let gse = session.gse(&acc("GSE500001"))?;
        let frame = gse.borrow().to_frame(Section::Info)?;

        let names: Vec<String> = frame
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, ["key", "GSM1000002", "GSM1000001"]);

        let keys = frame.column("key")?.as_materialized_series().str()?;
        let status_row = (0..frame.height())
            .find(|i| keys.get(*i) == Some("status"))
            .unwrap();
        assert_eq!(frame.column("GSM1000002")?.as_materialized_series().str()?.get(status_row), None);
        assert_eq!(
            frame.column("GSM1000001")?.as_materialized_series().str()?.get(status_row),
            Some("Public on Jan 01 2020")
        );
        Ok(())
    }

    #[rstest]
    fn empty_data_frame_without_loaded_samples(source: CountingSource) -> anyhow::Result<()> {
        let mut session = session(&source);
        let gse = session.gse(&acc("GSE500001"))?;
        let frame = gse.borrow().to_frame(Section::Data)?;
        assert_eq!(frame.width(), 1);
        assert_eq!(frame.height(), 0);
        Ok(())
    }
}
