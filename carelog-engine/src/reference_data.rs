//! Built-in reference ladders (WHO child growth standards, rounded), weeks 0 to 104.

use carelog_core::{MeasurementType, Sex};

type Row = (u32, [f64; 9]);

pub(crate) const TABLES: [(Sex, MeasurementType, &[Row]); 6] = [
    (Sex::Male, MeasurementType::Weight, MALE_WEIGHT),
    (Sex::Female, MeasurementType::Weight, FEMALE_WEIGHT),
    (Sex::Male, MeasurementType::Height, MALE_LENGTH),
    (Sex::Female, MeasurementType::Height, FEMALE_LENGTH),
    (Sex::Male, MeasurementType::HeadCircumference, MALE_HEAD),
    (Sex::Female, MeasurementType::HeadCircumference, FEMALE_HEAD),
];

// p3, p5, p10, p25, p50, p75, p90, p95, p97
const MALE_WEIGHT: &[Row] = &[
    (0, [2.5, 2.6, 2.8, 3.0, 3.3, 3.7, 3.9, 4.1, 4.3]),
    (4, [3.4, 3.6, 3.8, 4.1, 4.5, 4.9, 5.3, 5.5, 5.7]),
    (8, [4.4, 4.5, 4.7, 5.1, 5.6, 6.0, 6.4, 6.7, 6.9]),
    (13, [5.1, 5.2, 5.5, 5.9, 6.4, 6.9, 7.3, 7.6, 7.8]),
    (17, [5.6, 5.8, 6.0, 6.5, 7.0, 7.5, 8.0, 8.3, 8.5]),
    (26, [6.4, 6.6, 6.9, 7.4, 7.9, 8.5, 9.0, 9.3, 9.5]),
    (39, [7.2, 7.4, 7.7, 8.3, 8.9, 9.5, 10.1, 10.4, 10.7]),
    (52, [7.8, 8.0, 8.3, 8.9, 9.6, 10.3, 10.9, 11.3, 11.5]),
    (78, [8.9, 9.1, 9.5, 10.2, 10.9, 11.7, 12.5, 12.9, 13.2]),
    (104, [9.8, 10.1, 10.5, 11.3, 12.2, 13.1, 13.9, 14.4, 14.8]),
];

const FEMALE_WEIGHT: &[Row] = &[
    (0, [2.4, 2.5, 2.7, 2.9, 3.2, 3.6, 3.9, 4.0, 4.2]),
    (4, [3.2, 3.3, 3.5, 3.8, 4.2, 4.6, 5.0, 5.2, 5.4]),
    (8, [4.0, 4.1, 4.3, 4.7, 5.1, 5.6, 6.0, 6.3, 6.5]),
    (13, [4.6, 4.7, 4.9, 5.4, 5.8, 6.3, 6.8, 7.1, 7.3]),
    (17, [5.1, 5.2, 5.5, 5.9, 6.4, 6.9, 7.4, 7.7, 7.9]),
    (26, [5.8, 6.0, 6.2, 6.7, 7.3, 7.9, 8.5, 8.8, 9.1]),
    (39, [6.6, 6.8, 7.0, 7.6, 8.2, 8.9, 9.5, 9.9, 10.2]),
    (52, [7.1, 7.3, 7.6, 8.2, 8.9, 9.7, 10.4, 10.8, 11.1]),
    (78, [8.2, 8.4, 8.8, 9.5, 10.2, 11.1, 11.9, 12.4, 12.7]),
    (104, [9.2, 9.4, 9.8, 10.6, 11.5, 12.5, 13.4, 14.0, 14.4]),
];

const MALE_LENGTH: &[Row] = &[
    (0, [46.3, 46.8, 47.5, 48.6, 49.9, 51.2, 52.3, 53.0, 53.4]),
    (4, [51.1, 51.5, 52.2, 53.4, 54.7, 56.0, 57.2, 57.9, 58.4]),
    (8, [54.7, 55.1, 55.9, 57.1, 58.4, 59.8, 61.0, 61.7, 62.2]),
    (13, [57.6, 58.1, 58.8, 60.1, 61.4, 62.8, 64.0, 64.8, 65.3]),
    (17, [60.0, 60.5, 61.2, 62.5, 63.9, 65.3, 66.6, 67.4, 67.8]),
    (26, [63.6, 64.1, 64.8, 66.2, 67.6, 69.1, 70.4, 71.2, 71.6]),
    (39, [68.7, 69.2, 70.1, 71.6, 73.2, 74.7, 76.2, 77.0, 77.5]),
    (52, [71.3, 71.8, 72.8, 74.1, 75.7, 77.4, 78.9, 79.7, 80.2]),
    (78, [77.2, 77.8, 78.9, 80.5, 82.3, 84.1, 85.7, 86.6, 87.3]),
    (104, [81.7, 82.4, 83.5, 85.3, 87.1, 89.0, 90.7, 91.7, 92.4]),
];

const FEMALE_LENGTH: &[Row] = &[
    (0, [45.6, 46.1, 46.8, 47.9, 49.1, 50.4, 51.5, 52.2, 52.7]),
    (4, [50.0, 50.5, 51.2, 52.4, 53.7, 55.0, 56.2, 56.9, 57.4]),
    (8, [53.2, 53.7, 54.5, 55.7, 57.1, 58.4, 59.6, 60.4, 60.9]),
    (13, [55.8, 56.3, 57.1, 58.4, 59.8, 61.2, 62.5, 63.3, 63.8]),
    (17, [58.0, 58.5, 59.3, 60.6, 62.1, 63.5, 64.8, 65.7, 66.2]),
    (26, [61.5, 62.0, 62.8, 64.2, 65.7, 67.3, 68.6, 69.5, 70.0]),
    (39, [66.1, 66.6, 67.5, 69.0, 70.6, 72.2, 73.7, 74.6, 75.1]),
    (52, [69.2, 69.8, 70.8, 72.4, 74.0, 75.7, 77.3, 78.2, 78.9]),
    (78, [75.2, 75.8, 76.9, 78.6, 80.7, 82.7, 84.4, 85.4, 86.2]),
    (104, [80.0, 80.8, 82.0, 83.9, 86.0, 88.1, 90.0, 91.1, 91.9]),
];

const MALE_HEAD: &[Row] = &[
    (0, [32.1, 32.4, 32.8, 33.6, 34.5, 35.3, 36.1, 36.5, 36.9]),
    (4, [35.1, 35.4, 35.8, 36.5, 37.3, 38.1, 38.8, 39.2, 39.5]),
    (8, [36.9, 37.2, 37.6, 38.3, 39.1, 39.9, 40.6, 41.0, 41.3]),
    (13, [38.3, 38.6, 39.0, 39.7, 40.5, 41.3, 42.0, 42.4, 42.7]),
    (17, [39.4, 39.7, 40.1, 40.8, 41.6, 42.4, 43.1, 43.6, 43.9]),
    (26, [41.0, 41.3, 41.7, 42.5, 43.3, 44.2, 44.9, 45.3, 45.6]),
    (39, [42.6, 42.9, 43.3, 44.1, 45.0, 45.8, 46.6, 47.0, 47.3]),
    (52, [43.6, 43.9, 44.3, 45.1, 46.1, 46.9, 47.7, 48.1, 48.4]),
    (78, [44.9, 45.2, 45.6, 46.4, 47.4, 48.3, 49.1, 49.5, 49.8]),
    (104, [45.7, 46.0, 46.5, 47.3, 48.3, 49.2, 50.0, 50.4, 50.7]),
];

const FEMALE_HEAD: &[Row] = &[
    (0, [31.7, 32.0, 32.4, 33.1, 33.9, 34.7, 35.4, 35.8, 36.1]),
    (4, [34.3, 34.6, 35.0, 35.7, 36.5, 37.3, 38.0, 38.4, 38.8]),
    (8, [36.0, 36.2, 36.7, 37.4, 38.3, 39.1, 39.8, 40.2, 40.5]),
    (13, [37.2, 37.5, 38.0, 38.7, 39.5, 40.4, 41.1, 41.5, 41.9]),
    (17, [38.2, 38.5, 38.9, 39.7, 40.6, 41.4, 42.2, 42.6, 43.0]),
    (26, [39.7, 40.0, 40.5, 41.3, 42.2, 43.1, 43.9, 44.3, 44.6]),
    (39, [41.2, 41.5, 42.0, 42.8, 43.8, 44.6, 45.4, 45.9, 46.2]),
    (52, [42.2, 42.5, 43.0, 43.8, 44.9, 45.7, 46.5, 47.0, 47.3]),
    (78, [43.6, 43.9, 44.4, 45.2, 46.2, 47.1, 48.0, 48.4, 48.8]),
    (104, [44.6, 44.9, 45.3, 46.2, 47.2, 48.1, 49.0, 49.5, 49.8]),
];
