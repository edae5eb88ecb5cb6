/*!

This is the long-form manual for `exclusion_indicators` and `excalc`.

## Indicators

For every record, four indicators are computed:

* **binary exclusion index**: 1 when the person has none of the configured
  access dimensions (complete digital exclusion), 0 otherwise.
* **ordinal exclusion index**: a ranked measure of access completeness,
  either a raw count of available dimensions or a floored percentage scale.
* **digital vulnerability percentage**: the magnitude of the digital
  exclusion, monotonically decreasing as access improves.
* **social-mobility vulnerability percentage**: the risk that the person
  will have difficulty improving their living conditions, from educational
  attainment, ICT training and (in some variants) digital exclusion.

## Input formats

The following formats are supported by `excalc`:
* `csv` Comma Separated Values with a header row
* `xlsx` Excel spreadsheets
* `eph` the national household survey format (EPH), with column-name
  normalization, numeric code remapping and household/individual table
  merging

### `csv`

A header row followed by one record per row. Column names are normalized
(case, accents and spacing are not significant), so `Nivel Educativo` and
`nivel_educativo` address the same field. The recognized columns are:

```text
sexo,edad,nivel_educativo,acceso_computadora,acceso_internet,capacitacion_tic,region,provincia
Mujer,34,Primario completo,Sí,No,No,Cuyo,San Juan
```

Unknown columns are ignored. Missing or unrecognized values resolve to an
unknown state and the dependent indicators are left empty for that record.

### `xlsx`

Same layout as `csv`, read from an Excel worksheet. The first worksheet is
used unless a name is provided with `--excel-worksheet-name` or the
`excelWorksheetName` configuration key.

### `eph`

Microdata of the national household survey. The reader understands the
survey's column names and numeric codings and translates them to the
canonical vocabulary:

| survey column | canonical column     | coding                    |
|---------------|----------------------|---------------------------|
| CH04          | sexo                 | 1 = varón, 2 = mujer      |
| CH06          | edad                 | years                     |
| NIVEL_ED      | nivel_educativo      | 1..7, 9 = no answer       |
| REGION        | region               | 1, 40..44                 |
| IH_II_01      | acceso_computadora   | 1 = sí, 2 = no            |
| IH_II_02      | acceso_internet      | 1 = sí, 2 = no            |
| IP_III_06     | capacitacion_tic     | 1 = sí, 2 = no            |

When the access attributes live in the household table and the person
attributes in the individual table, pass the household file with
`--household-input` (or `householdFilePath`); the two tables are merged on
the shared key (`CODUSU`, `NRO_HOGAR`).

## Configuration

`excalc` comes with sensible defaults but accepts a configuration file in
JSON to select formula variants and map nonstandard inputs:

```json
{
    "outputSettings": {
        "surveyName": "EPH 2023 T4",
        "outputDirectory": "out"
    },
    "recordFileSources": [
        {
            "provider": "eph",
            "filePath": "usu_individual.csv",
            "householdFilePath": "usu_hogar.csv"
        }
    ],
    "formula": {
        "variant": "reference"
    }
}
```

Keys of `formula`:
- `variant` (string): `reference`, `thresholdAdditive`, `legacyTwoDimension`
  or `stepped`. See the crate documentation for the exact shapes.
- `dimensions` (string, optional): `computerInternet` or
  `computerInternetTraining`, overriding the dimension set of the variant.
- `ordinalFloor`, `digitalFloor` (number, optional): switch the respective
  scale to its floored-percentage shape with the given floor.
- `educationPenalty`, `trainingPenalty`, `exclusionPenalty` (number,
  optional): penalty magnitudes for the additive mobility shape.
- `lowAttainmentCutoff` (string, optional): the highest education label that
  still takes the education penalty.
- `scoreTable` (array of 7 or 9 numbers, optional): burden weights for the
  score-table mobility shape, no-instruction first, non-increasing.
- `educationWeight` (number, optional): scale of the education contribution
  under the score-table shape.
- `missingEducationPolicy` (string, optional): `zero` or `undefined`.

Keys of each entry of `recordFileSources`:
- `provider` (string): `csv`, `xlsx` or `eph`.
- `filePath` (string): the spreadsheet location, relative to the
  configuration file.
- `excelWorksheetName` (string, optional)
- `columnAliases` (object, optional): source column name to canonical
  column name, for inputs with nonstandard headers.
- `householdFilePath` (string, optional): companion household table for
  the `eph` provider.
- `mergeKeyColumns` (array of strings, optional): the shared key for the
  household merge. Defaults to `["CODUSU", "NRO_HOGAR"]`.
- `idColumn` (string, optional): the column holding the record identifier.

*/
