//! Harnais de conformité : chaque fichier de `tests/programs/` déclare sa
//! sortie attendue dans ses lignes préfixées par `"# "` (préfixe retiré) ;
//! exécuter le fichier entier doit produire exactement leur concaténation.
//! Le `#` ouvrant un commentaire du langage, les déclarations sont
//! invisibles pour le tokenizer.

use std::{fs, path::Path};

use pretty_assertions::assert_eq;

#[test]
fn fixture_programs_match_their_declared_output() {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/programs");
    let mut ran = 0usize;

    let mut entries: Vec<_> = fs::read_dir(&dir)
        .expect("could not read tests/programs")
        .map(|e| e.expect("dir entry").path())
        .collect();
    entries.sort();

    for path in entries {
        if path.extension().and_then(|e| e.to_str()) != Some("spr") {
            continue;
        }
        let src = fs::read(&path).expect("could not read fixture");

        let mut expected = String::new();
        for line in String::from_utf8_lossy(&src).lines() {
            if let Some(decl) = line.strip_prefix("# ") {
                expected.push_str(decl);
                expected.push('\n');
            }
        }

        let mut out = Vec::new();
        sprat_cli::run_bytes(&src, &mut out)
            .unwrap_or_else(|e| panic!("could not run {}: {e}", path.display()));

        assert_eq!(
            String::from_utf8(out).unwrap(),
            expected,
            "output mismatch for {}",
            path.display()
        );
        ran += 1;
    }

    assert!(ran > 0, "no fixture programs found in {}", dir.display());
}
