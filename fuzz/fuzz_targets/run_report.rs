#![no_main]

use libfuzzer_sys::fuzz_target;
use perfbound::{DiffConfig, DiffEngine, Matrix, RunReport};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(report) = RunReport::from_json_str(input) else {
        return;
    };

    // Empty matrix: every suite is noted as missing its spec
    let matrix = Matrix::new(report.meta.matrix_id.clone());
    for config in [DiffConfig::strict(), DiffConfig::triage()] {
        let _ = DiffEngine::new(config).diff(&matrix, &report, &report);
    }
});
