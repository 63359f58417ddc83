use enthalpy_core::tdb::Database;

// A trimmed but structurally complete database: comments, multi-segment
// piecewise functions, function references, sublattice constituents, and a
// Redlich-Kister interaction parameter.
const ALLOY_FIXTURE: &str = r#"
$ Demonstration Fe-Ni assessment, heavily truncated.
$ ------------------------------------------------------
 ELEMENT /-   ELECTRON_GAS     0.0000E+00 0.0000E+00 0.0000E+00 !
 ELEMENT VA   VACUUM           0.0000E+00 0.0000E+00 0.0000E+00 !
 ELEMENT FE   BCC_A2           5.5847E+01 4.4890E+03 2.7280E+01 !
 ELEMENT NI   FCC_A1           5.8690E+01 4.7870E+03 2.9796E+01 !

 FUNCTION GHSERFE 298.15 +1225.7+124.134*T-23.5143*T*LN(T)
     -.00439752*T**2-5.8927E-08*T**3+77359*T**(-1); 1811 Y
     -25383.581+299.31255*T-46*T*LN(T)+2.29603E+31*T**(-9); 6000 N !
 FUNCTION GHSERNI 298.15 -5179.159+117.854*T-22.096*T*LN(T)
     -.0048407*T**2; 1728 Y
     -27840.655+279.135*T-43.1*T*LN(T)+1.12754E+31*T**(-9); 6000 N !
 FUNCTION GFELIQ 298.15 +GHSERFE#+12040.17-6.55843*T; 6000 N !

 TYPE_DEFINITION % SEQ * !

 PHASE LIQUID:L %  1  1.0 !
 CONSTITUENT LIQUID:L :FE,NI: !

 PHASE FCC_A1  %  2  1.0  1.0 !
 CONSTITUENT FCC_A1 :FE%,NI : VA: !

 PARAMETER G(LIQUID,FE;0) 298.15 +GFELIQ#; 6000 N !
 PARAMETER G(LIQUID,NI;0) 298.15 +GHSERNI#+16414.686-9.397*T; 6000 N !
 PARAMETER G(FCC_A1,FE:VA;0) 298.15 +GHSERFE#-1462.4+8.282*T; 6000 N !
 PARAMETER G(FCC_A1,NI:VA;0) 298.15 +GHSERNI#; 6000 N !
 PARAMETER G(LIQUID,FE,NI;0) 298.15 -16911+5.1622*T; 6000 N !
 PARAMETER G(LIQUID,FE,NI;1) 298.15 +10180-4.146656*T; 6000 N !
"#;

const NO_ELEMENT_FIXTURE: &str = r#"
 PHASE LIQUID % 1 1.0 !
 CONSTITUENT LIQUID :FE: !
"#;

#[test]
fn fixture_statements_survive_comments_and_continuations() {
    let database = Database::parse_str(ALLOY_FIXTURE).expect("fixture database should parse");

    assert_eq!(database.elements(), ["/-", "VA", "FE", "NI"]);
    assert_eq!(database.selectable_elements(), ["FE", "NI"]);
    assert_eq!(database.functions().len(), 3);
    assert!(database.functions().contains_key("GHSERFE"));
    assert_eq!(database.phases().len(), 2);
}

#[test]
fn phase_names_drop_type_suffixes_and_keep_sublattices() {
    let database = Database::parse_str(ALLOY_FIXTURE).expect("fixture database should parse");

    let liquid = database.phase("LIQUID").expect("liquid phase should exist");
    assert_eq!(liquid.name, "LIQUID");
    assert_eq!(liquid.site_counts, [1.0]);

    let fcc = database.phase("fcc_a1").expect("phase lookup should ignore case");
    assert_eq!(fcc.site_counts, [1.0, 1.0]);
    assert_eq!(fcc.constituents.len(), 2);
    assert_eq!(fcc.constituents[0], ["FE", "NI"]);
    assert_eq!(fcc.constituents[1], ["VA"]);
}

#[test]
fn default_phase_selection_is_the_first_two_in_file_order() {
    let database = Database::parse_str(ALLOY_FIXTURE).expect("fixture database should parse");
    assert_eq!(database.default_phase_selection(), ["LIQUID", "FCC_A1"]);
}

#[test]
fn pure_and_interaction_parameters_resolve_per_phase() {
    let database = Database::parse_str(ALLOY_FIXTURE).expect("fixture database should parse");

    assert!(database.pure_gibbs("LIQUID", "FE").is_some());
    assert!(database.pure_gibbs("FCC_A1", "NI").is_some());
    assert!(
        database.pure_gibbs("FCC_A1", "CU").is_none(),
        "unassessed element should have no end-member parameter"
    );

    let interactions = database.binary_interactions("LIQUID", "FE", "NI");
    assert_eq!(interactions.len(), 2);
    assert_eq!(interactions[0].order, 0);
    assert_eq!(interactions[1].order, 1);
    assert!(
        database.binary_interactions("FCC_A1", "FE", "NI").is_empty(),
        "no FCC interaction is assessed in the fixture"
    );
}

#[test]
fn piecewise_functions_evaluate_on_both_sides_of_a_breakpoint() {
    let database = Database::parse_str(ALLOY_FIXTURE).expect("fixture database should parse");
    let functions = database.functions();
    let ghserfe = &functions["GHSERFE"];

    let below = ghserfe.eval(1000.0, functions).expect("low branch should evaluate");
    let above = ghserfe.eval(2000.0, functions).expect("high branch should evaluate");

    let t: f64 = 1000.0;
    let expected_below = 1225.7 + 124.134 * t - 23.5143 * t * t.ln() - 0.00439752 * t * t
        - 5.8927e-8 * t.powi(3)
        + 77359.0 / t;
    assert!((below.value - expected_below).abs() < 1.0e-6);

    let t: f64 = 2000.0;
    let expected_above =
        -25383.581 + 299.31255 * t - 46.0 * t * t.ln() + 2.29603e31 * t.powf(-9.0);
    assert!((above.value - expected_above).abs() < 1.0e-6);
}

#[test]
fn function_references_chain_through_named_functions() {
    let database = Database::parse_str(ALLOY_FIXTURE).expect("fixture database should parse");
    let functions = database.functions();

    let t = 1000.0;
    let ghserfe = functions["GHSERFE"].eval(t, functions).expect("base should evaluate");
    let gfeliq = functions["GFELIQ"].eval(t, functions).expect("reference should evaluate");
    assert!((gfeliq.value - (ghserfe.value + 12040.17 - 6.55843 * t)).abs() < 1.0e-6);
    // The derivative flows through the reference too.
    assert!((gfeliq.dt - (ghserfe.dt - 6.55843)).abs() < 1.0e-9);
}

#[test]
fn database_without_elements_is_rejected_with_a_parse_diagnostic() {
    let error = Database::parse_str(NO_ELEMENT_FIXTURE)
        .expect_err("element-free database should be rejected");
    assert_eq!(error.placeholder(), "TDB.NO_ELEMENTS");
    assert_eq!(error.exit_code(), 3);
}

#[test]
fn malformed_statements_report_their_line() {
    let error = Database::parse_str(" ELEMENT FE BCC 55.8 0 0 !\n FUNCTION BROKEN 298.15 +1??2; 6000 N !\n")
        .expect_err("garbage expression should be rejected");
    assert_eq!(error.exit_code(), 3);
    assert!(
        error.message().contains("line 2"),
        "diagnostic should carry the statement line, got: {}",
        error.message()
    );
}
