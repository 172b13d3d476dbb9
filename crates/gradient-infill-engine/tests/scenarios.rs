//! End-to-end transform scenarios

use gradient_infill_core::{Error, PreconditionError};
use gradient_infill_engine::{GradientInfill, RegionClassifier, RegionLabel};
use gradient_infill_gcode::{MotionRecord, ProgramParser, WallSource};
use gradient_infill_settings::GradientSettings;

const SQUARE_WALL: &str = "M83
;LAYER:0
;TYPE:WALL-INNER
G1 X0 Y0 F1800
G1 X10 Y0 E1
G1 X10 Y10 E1
G1 X0 Y10 E1
G1 X0 Y0 E1
;TYPE:FILL
";

fn scenario_settings() -> GradientSettings {
    let mut settings = GradientSettings::default();
    settings.flow.min_flow = 0.2;
    settings.flow.max_flow = 1.0;
    settings.flow.max_distance = 5.0;
    settings.flow.steps = 0;
    settings.subdivision.max_move_length = 100.0;
    settings
}

fn infill_extrusions(output: &str) -> Vec<f64> {
    let program = ProgramParser::default().parse(output).expect("parse output");
    let classification = RegionClassifier::new().classify(&program);
    program
        .records
        .iter()
        .enumerate()
        .filter(|(i, _)| classification.label_of(*i) == Some(RegionLabel::Infill))
        .filter_map(|(_, r)| r.as_move())
        .filter_map(|m| m.e.filter(|e| *e != 0.0))
        .collect()
}

fn transform(settings: GradientSettings, input: &str) -> String {
    GradientInfill::new(settings)
        .expect("valid settings")
        .process(input)
        .expect("transform")
}

#[test]
fn test_centre_move_uses_nearer_endpoint() {
    // The worked example for this move quotes about 5 mm and full flow, but
    // the nearer-endpoint rule it also states gives 4 mm: (5,6) is 4 mm from
    // the top wall. The rule wins, so the multiplier is 0.84.
    let input = format!("{}G0 X5 Y5\nG1 X5 Y6 E1.0\n", SQUARE_WALL);
    let output = transform(scenario_settings(), &input);
    let e = infill_extrusions(&output);
    assert_eq!(e.len(), 1);
    assert!((e[0] - (0.2 + 0.8 * 4.0 / 5.0)).abs() < 1e-5);
}

#[test]
fn test_far_move_saturates() {
    let mut settings = scenario_settings();
    settings.flow.max_distance = 4.0;
    let input = format!("{}G0 X5 Y5\nG1 X5 Y6 E1.0\n", SQUARE_WALL);
    let output = transform(settings, &input);
    let e = infill_extrusions(&output);
    assert!((e[0] - 1.0).abs() < 1e-9);
    assert!(output.contains("G1 X5 Y6 E1\n"));
}

#[test]
fn test_near_wall_move() {
    let input = format!("{}G0 X0.1 Y5\nG1 X0.1 Y6 E1.0\n", SQUARE_WALL);
    let output = transform(scenario_settings(), &input);
    let e = infill_extrusions(&output);
    assert!((e[0] - 0.216).abs() < 1e-5);
    assert!(output.contains("G1 X0.1 Y6 E0.216\n"));
}

#[test]
fn test_steps_quantize_output() {
    let mut settings = scenario_settings();
    settings.flow.steps = 4;
    // 2.5 mm from the left wall maps to 0.6 continuously
    let input = format!("{}G0 X2.5 Y5\nG1 X2.5 Y5.5 E1.0\n", SQUARE_WALL);
    let first = transform(settings.clone(), &input);
    let second = transform(settings, &input);
    assert_eq!(first, second);
    let e = infill_extrusions(&first);
    assert!((e[0] - (0.2 + 0.8 * 2.0 / 3.0)).abs() < 1e-5);
}

#[test]
fn test_no_infill_is_byte_identical() {
    let input = "; header\r\nM83\r\n;LAYER:0\r\n;TYPE:WALL-INNER\r\nG1   X0 Y0\r\nG1 X10.000 Y0 E1\r\n;TYPE:WALL-OUTER\r\nG1 X0 Y0 E1";
    let output = transform(GradientSettings::default(), input);
    assert_eq!(output, input);
}

#[test]
fn test_untouched_lines_survive_rewrite() {
    let input = format!(
        "{}G0 X0.1 Y5\nG1 X0.1 Y6 E1.0\n;TYPE:SKIN\nG1   X3 Y3 E0.50000 ; skin\nM107\n",
        SQUARE_WALL
    );
    let output = transform(scenario_settings(), &input);
    for line in SQUARE_WALL.lines() {
        assert!(output.contains(line), "missing {:?}", line);
    }
    assert!(output.contains("G1   X3 Y3 E0.50000 ; skin\nM107\n"));
    assert!(output.contains("G0 X0.1 Y5\n"));
}

#[test]
fn test_crlf_output() {
    let input = format!("{}G0 X0.1 Y5\nG1 X0.1 Y6 E1.0\n", SQUARE_WALL).replace('\n', "\r\n");
    let output = transform(scenario_settings(), &input);
    assert!(output.contains("G1 X0.1 Y6 E0.216\r\n"));
    assert_eq!(output.matches('\n').count(), output.matches("\r\n").count());
}

#[test]
fn test_rewrite_is_idempotent_on_geometry() {
    let mut settings = GradientSettings::default();
    settings.subdivision.max_move_length = 1.0;
    let input = format!("{}G0 X1 Y2\nG1 X9 Y2 E2.0\nG1 X9 Y8 E1.5\n", SQUARE_WALL);

    let once = transform(settings.clone(), &input);
    let twice = transform(settings, &once);

    let parser = ProgramParser::default();
    let walls_once = RegionClassifier::new()
        .classify(&parser.parse(&once).expect("parse"))
        .layers;
    let walls_twice = RegionClassifier::new()
        .classify(&parser.parse(&twice).expect("parse"))
        .layers;
    assert_eq!(walls_once, walls_twice);

    // already-short moves are not split again and get the same multipliers
    let e_in = infill_extrusions(&input);
    let e_once = infill_extrusions(&once);
    let e_twice = infill_extrusions(&twice);
    assert_eq!(e_in.len(), 2);
    assert_eq!(e_once.len(), e_twice.len());
    assert_eq!(e_once.len(), 14);

    let shares = [0.25; 8].into_iter().chain([0.25; 6]);
    for ((first, second), share) in e_once.iter().zip(&e_twice).zip(shares) {
        let multiplier = first / share;
        assert!((second - first * multiplier).abs() < 1e-4);
    }
}

#[test]
fn test_absolute_extrusion_is_rejected() {
    let input = format!("{}G1 X5 Y5 E1\n", SQUARE_WALL.replace("M83", "M82"));
    let err = GradientInfill::new(GradientSettings::default())
        .expect("transform")
        .process(&input)
        .unwrap_err();
    match err {
        Error::Precondition(precondition) => assert_eq!(
            precondition,
            PreconditionError::AbsoluteExtrusion {
                line_number: 10,
                content: "G1 X5 Y5 E1".to_string(),
            }
        ),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_relative_positioning_is_rejected() {
    let input = format!("{}G91\nG1 X1 Y1 E1\n", SQUARE_WALL);
    let err = GradientInfill::new(GradientSettings::default())
        .expect("transform")
        .process(&input)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Precondition(PreconditionError::RelativePositioning { line_number: 11, .. })
    ));
}

#[test]
fn test_parse_error_aborts_transform() {
    let input = format!("{}G1 X5 Y5 E1.2.3\n", SQUARE_WALL);
    let err = GradientInfill::new(GradientSettings::default())
        .expect("transform")
        .process(&input)
        .unwrap_err();
    assert!(err.is_parse_error());
    match err {
        Error::Parse(parse) => assert_eq!(parse.line_number(), 10),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_outer_wall_source() {
    let input = "M83
;LAYER:0
;TYPE:WALL-OUTER
G1 X0 Y0
G1 X10 Y0 E1
;TYPE:WALL-INNER
G1 X5 Y4 E1
;TYPE:FILL
G1 X5 Y5 E1
";
    let mut settings = scenario_settings().with_wall_source(WallSource::Outer);
    settings.flow.max_distance = 10.0;
    let output = transform(settings, input);
    let e = infill_extrusions(&output);
    // distance to the outer wall at y=0 is 4 (start) and 5 (end)
    assert!((e[0] - (0.2 + 0.8 * 4.0 / 10.0)).abs() < 1e-5);
}

#[test]
fn test_infill_before_walls_is_far() {
    let input = "M83
;LAYER:0
;TYPE:FILL
G1 X0 Y0
G1 X0.5 Y0 E1
;TYPE:WALL-INNER
G1 X0 Y1 E1
";
    let output = transform(scenario_settings(), input);
    let program = ProgramParser::default().parse(&output).expect("parse");
    let e: Vec<f64> = program
        .records
        .iter()
        .filter_map(MotionRecord::as_move)
        .filter_map(|m| m.e)
        .collect();
    assert!((e[0] - 1.0).abs() < 1e-9);
}

#[test]
fn test_gradual_speed_output() {
    let mut settings = scenario_settings();
    settings.speed.gradual_speed = true;
    let input = format!(
        "{}G0 X0.1 Y5\nG1 X0.1 Y6 E1.0\n;TYPE:SKIN\nG1 X1 Y1 E0.2\n",
        SQUARE_WALL
    );
    let output = transform(settings, &input);
    assert!(output.contains("G1 X0.1 Y6 E0.216 F3600\n;TYPE:SKIN\nG1 F1800\nG1 X1 Y1 E0.2\n"));
}

#[test]
fn test_rewrite_changes_only_extrusion_text() {
    let input = format!("{}G0 X5 Y5\nG1 F1234.5 X5.12345 Y6.98765 E1 ;fill\n", SQUARE_WALL);
    let output = transform(scenario_settings(), &input);
    let line = output
        .lines()
        .find(|l| l.ends_with(";fill"))
        .expect("rewritten line");
    assert!(line.starts_with("G1 F1234.5 X5.12345 Y6.98765 E"));
    assert_ne!(line, "G1 F1234.5 X5.12345 Y6.98765 E1 ;fill");
}

#[test]
fn test_short_move_flow_setting() {
    let mut settings = scenario_settings();
    settings.subdivision.max_move_length = 1.5;
    settings.flow.short_move_flow = Some(0.9);
    // threshold defaults to 3 mm
    let input = format!("{}G0 X1 Y5\nG1 X2 Y5 E1\nG1 X2 Y9 E1\n", SQUARE_WALL);
    let output = transform(settings, &input);
    let e = infill_extrusions(&output);

    assert!((e[0] - 0.9).abs() < 1e-9);
    // the 4 mm move is split and follows the gradient
    assert_eq!(e.len(), 1 + 3);
    assert!(e[1..].iter().all(|v| (*v - 0.9 / 3.0).abs() > 1e-6));
}
