/*!

# Quick start

This example runs the calculator end to end over a small spreadsheet of
survey answers.

**Preparing the data** Collect one row per person with the answers of the
entry form. Any spreadsheet tool can produce the file; save it as CSV or
Excel (.xlsx):

```text
sexo,edad,nivel_educativo,acceso_computadora,acceso_internet,capacitacion_tic,region,provincia
Mujer,34,Primario completo,Sí,No,No,Cuyo,San Juan
Varón,61,Sin instrucción,No,No,No,Noroeste,Salta
Mujer,22,Superior universitario incompleto,Sí,Sí,Sí,Pampeana,Córdoba
```

**Running the calculator**

```bash
excalc -i personas.csv --results resultados.csv --out resultados.json
```

The program logs each record and writes `resultados.csv` with the four
computed columns appended:

```text
id,sexo,edad,...,indice_binario,indice_ordinal,vulnerabilidad_digital,vulnerabilidad_movilidad
personas-00000002,Mujer,34,...,0,40,70,95.71
personas-00000003,Varón,61,...,1,10,100,100
personas-00000004,Mujer,22,...,0,100,10,24.29
```

A record with a missing or unrecognized answer keeps its row, with the
indicators that depend on the missing answer left empty.

**Single person** The same computation is available without a spreadsheet,
passing the answers of the form directly:

```bash
excalc --sex Mujer --age 34 --education "Primario completo" \
    --computer Sí --internet No --training No --region Cuyo
```

```text
Índice Binario de Exclusión Digital: 0
Índice Ordinal de Exclusión Digital: 40
Porcentaje de Vulnerabilidad Digital: 70%
Porcentaje de Vulnerabilidad de Movilidad Social: 95.71%
```

**Choosing a formula variant** The default is the reference variant
(three access dimensions, floor-10 percentage scales, score-table
mobility). The earlier published formulas remain available as presets:

```bash
excalc -i personas.csv --variant legacyTwoDimension
```

- if your input comes from the national household survey microdata, use
  `--input-type eph`; the reader normalizes the survey's column names and
  numeric codes, and `--household-input` merges the household table when
  the access attributes are split across files. See the
  [manual](../manual/index.html#eph).
- to pin down every formula parameter in a reviewable file, use the
  `--config` flag. See the [configuration section](../manual/index.html#configuration).

*/
