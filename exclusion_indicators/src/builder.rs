pub use crate::config::*;
use crate::run_indicator_stats;

/// A builder for assembling a batch of records.
///
/// It accepts either typed records or the raw survey labels, mapping
/// unrecognized labels to the explicit unknown state.
///
/// ```
/// pub use exclusion_indicators::builder::Builder;
/// pub use exclusion_indicators::FormulaConfig;
/// # use exclusion_indicators::IndicatorErrors;
///
/// let mut builder = Builder::new(&FormulaConfig::reference())?;
///
/// builder.add_record_labels(
///     "Mujer", "34", "Primario completo", "Sí", "No", "No", "Cuyo", "San Juan",
/// )?;
///
/// let results = builder.compute()?;
/// assert_eq!(results.len(), 1);
///
/// # Ok::<(), IndicatorErrors>(())
/// ```
pub struct Builder {
    pub(crate) _config: FormulaConfig,
    pub(crate) _records: Vec<PersonRecord>,
}

impl Builder {
    pub fn new(config: &FormulaConfig) -> Result<Builder, IndicatorErrors> {
        config.validate()?;
        Ok(Builder {
            _config: config.clone(),
            _records: Vec::new(),
        })
    }

    /// Adds an already-typed record to the batch.
    pub fn add_record(&mut self, record: &PersonRecord) -> Result<(), IndicatorErrors> {
        self._records.push(record.clone());
        Ok(())
    }

    /// Adds a record from the raw survey labels, in the order of the entry
    /// form: sex, age, education level, computer access, internet access,
    /// ICT training, region, province.
    ///
    /// A label that does not belong to the recognized vocabulary resolves to
    /// the unknown state for that field, never to a valid category.
    #[allow(clippy::too_many_arguments)]
    pub fn add_record_labels(
        &mut self,
        sex: &str,
        age: &str,
        education_level: &str,
        computer_access: &str,
        internet_access: &str,
        ict_training: &str,
        region: &str,
        province: &str,
    ) -> Result<(), IndicatorErrors> {
        let record = PersonRecord {
            sex: Sex::from_label(sex),
            age: age.trim().parse::<u32>().ok().filter(|a| *a <= MAX_AGE),
            education_level: EducationLevel::from_label(education_level),
            has_computer_access: parse_yes_no(computer_access),
            has_internet_access: parse_yes_no(internet_access),
            has_ict_training: parse_yes_no(ict_training),
            region: Region::from_label(region),
            province: match province.trim() {
                "" => None,
                p => Some(p.to_string()),
            },
        };
        self.add_record(&record)
    }

    pub fn records(&self) -> &[PersonRecord] {
        &self._records
    }

    /// Runs the calculator over the accumulated batch.
    pub fn compute(&self) -> Result<Vec<IndicatorResult>, IndicatorErrors> {
        run_indicator_stats(&self._records, &self._config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_labels_resolve_to_unknown_state() {
        let mut builder = Builder::new(&FormulaConfig::reference()).unwrap();
        builder
            .add_record_labels("X", "300", "doctorado", "tal vez", "Sí", "No", "Marte", "")
            .unwrap();
        let record = &builder.records()[0];
        assert_eq!(record.sex, None);
        assert_eq!(record.age, None);
        assert_eq!(record.education_level, None);
        assert_eq!(record.has_computer_access, None);
        assert_eq!(record.has_internet_access, Some(true));
        assert_eq!(record.has_ict_training, Some(false));
        assert_eq!(record.region, None);
        assert_eq!(record.province, None);
    }

    #[test]
    fn labels_tolerate_case_and_accents() {
        let mut builder = Builder::new(&FormulaConfig::reference()).unwrap();
        builder
            .add_record_labels(
                "VARON",
                "62",
                "sin instruccion",
                "si",
                "SÍ",
                "no",
                "Gran Buenos Aires",
                "  ",
            )
            .unwrap();
        let record = &builder.records()[0];
        assert_eq!(record.sex, Some(Sex::Male));
        assert_eq!(record.age, Some(62));
        assert_eq!(record.education_level, Some(EducationLevel::NoInstruction));
        assert_eq!(record.has_computer_access, Some(true));
        assert_eq!(record.has_internet_access, Some(true));
        assert_eq!(record.has_ict_training, Some(false));
        assert_eq!(record.region, Some(Region::GranBuenosAires));
        assert_eq!(record.province, None);
    }
}
