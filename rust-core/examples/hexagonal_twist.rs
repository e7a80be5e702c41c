/// Walk through the exact moire construction for twisted hexagonal lattices.
///
/// The rotation families are built on the rectangular β = 3 cell and then
/// re-expressed in the hexagonal basis with `hex_index`.
use moire::exact::{
    find_nicer_cell, hex_index, prim_rotation_moire_pq, prim_special_reflection_moire,
    rotation_diophantine_triple, HEX_BETA,
};
use moire::symbolic::{format_matrix, Expr};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Commensurate twists of the hexagonal lattice ===\n");

    // Example 1: a few members of the (p, q) family
    for (p, q) in [(1, 1), (2, 1), (3, 1), (3, 2)] {
        let (a, b, c) = rotation_diophantine_triple(HEX_BETA, p, q)?;
        let pattern = prim_rotation_moire_pq(HEX_BETA, p, q)?.visit_family_same(&hex_index())?;
        let supercell = pattern.c_matrix()?;
        let angle = (a.to_f64().unwrap_or(f64::NAN) / c.to_f64().unwrap_or(f64::NAN)).acos();
        println!("{}. (p, q) = ({}, {}):", p + q - 1, p, q);
        println!("   Triple (a, b, c): ({}, {}, {})", a, b, c);
        println!("   Twist angle: {:.3} degrees", angle.to_degrees());
        println!("   C = {}", format_matrix(&supercell));
        println!("   Relative volume: {}", pattern.relative_supercell_volume()?);
        println!("   Nicer basis: {}\n", format_matrix(&find_nicer_cell(&supercell)?));
    }

    // Example 2: the symbolic triple
    let (a, b, c) = rotation_diophantine_triple(HEX_BETA, Expr::symbol("p"), Expr::symbol("q"))?;
    println!("Symbolic triple: a = {}, b = {}, c = {}\n", a, b, c);

    // Example 3: reflection family
    let reflection = prim_special_reflection_moire(Expr::symbol("t"))?;
    println!("Reflection with symbolic t:");
    println!("   E = {}", format_matrix(reflection.e_matrix()));
    println!("   C = {}", format_matrix(&reflection.c_matrix()?));

    Ok(())
}
