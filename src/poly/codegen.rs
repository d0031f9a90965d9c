//! Emission of a source fragment evaluating a rational polynomial.
//!
//! The fragment declares one named intermediate per referenced monomial
//! power (the declaration is left without an initializer; computing the
//! power is the consuming context's business), declares named constants for
//! the non-unit coefficients, and ends in a `return` expression.

use std::collections::HashMap;
use std::fmt::Write;
use std::{error, fmt};

use super::RationalPolynomial;
use crate::terms::exponents;

/// An error from code emission.
#[derive(Debug)]
pub enum CodegenError {
    /// Power names only cover x, y, and z.
    TooManyVariables(usize),
}

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CodegenError::TooManyVariables(dims) => {
                write!(f, "cannot emit code for {dims} variables (max 3)")
            }
        }
    }
}

impl error::Error for CodegenError {}

/// Formats a coefficient with an explicit sign, round-trip exact.
fn ftoa(x: f64) -> String {
    if x >= 0.0 {
        format!("+{x:?}")
    } else {
        format!("{x:?}")
    }
}

/// Renders a sum of terms. Each term is a coefficient name, a power name,
/// or their product; a unit coefficient elides the multiply.
fn poly_expr(units: &[Option<&str>], coeffs: &[String], powers: &[&str]) -> String {
    let mut expr = String::new();

    for ((unit, coeff), power) in units.iter().zip(coeffs).zip(powers) {
        if !expr.is_empty() {
            expr.push_str("+ ");
        }

        if power.is_empty() {
            expr.push_str(coeff);
        } else if let Some(name) = unit {
            expr.push_str(name);
        } else {
            expr.push_str(coeff);
            expr.push('*');
            expr.push_str(power);
        }

        expr.push(' ');
    }

    expr.trim_end().to_string()
}

impl RationalPolynomial {
    /// Emits a code fragment computing the rational polynomial.
    ///
    /// Three shapes: a constant denominator folds into the numerator's
    /// coefficients and emits a plain polynomial; a constant numerator
    /// emits a (possibly negated) constant over the denominator; otherwise
    /// separate numerator and denominator expressions divide.
    pub fn code(&self) -> Result<String, CodegenError> {
        let dims = self.dims();

        if dims > 3 {
            return Err(CodegenError::TooManyVariables(dims));
        }

        let p = self.p();
        let q = self.q();
        let degree = self.degree();

        let mut out = String::new();
        let mut names: HashMap<usize, String> = HashMap::new();

        // Declare one intermediate per referenced power. Degree-0 and
        // degree-1 powers are always named.
        for (i, exp) in exponents(dims, degree).iter().enumerate() {
            let total: u32 = exp.iter().sum();
            let referenced =
                p.idxs().contains(&i) || q.idxs().contains(&i);

            if total > 1 && !referenced {
                continue;
            }

            let mut name = String::new();

            for (d, &e) in exp.iter().enumerate() {
                if e > 0 {
                    let _ = write!(name, "{}{e}", ["x", "y", "z"][d]);
                }
            }

            if !name.is_empty() {
                let _ = writeln!(out, "    f64 {name} = ;");
            }

            names.insert(i, name);
        }

        if q.idxs() == [0] {
            // Constant denominator: a plain polynomial.
            let scale = q.coeffs()[0];
            let mut units = Vec::new();
            let mut coeff_names = Vec::new();

            for (&i, &c) in p.idxs().iter().zip(p.coeffs()) {
                let c = c / scale;
                let unit = unit_power(c, &names[&i]);

                if unit.is_none() {
                    let _ = writeln!(out, "    f64 c{i} = {};", ftoa(c));
                }

                units.push(unit);
                coeff_names.push(format!("c{i}"));
            }

            let powers: Vec<&str> =
                p.idxs().iter().map(|i| names[i].as_str()).collect();

            let _ = write!(
                out,
                "    return {};",
                poly_expr(&units, &coeff_names, &powers)
            );

            return Ok(out);
        }

        if p.idxs() == [0] {
            // Constant numerator over the denominator.
            let scale = q.coeffs()[q.coeffs().len() - 1];
            let numer = p.coeffs()[0] / scale;

            let _ = writeln!(out, "    f64 n0 = {};", ftoa(numer.abs()));

            let mut units = Vec::new();
            let mut coeff_names = Vec::new();

            for (&i, &c) in q.idxs().iter().zip(q.coeffs()) {
                let c = c / scale;
                let unit = unit_power(c, &names[&i]);

                if unit.is_none() {
                    let _ = writeln!(out, "    f64 d{i} = {};", ftoa(c));
                }

                units.push(unit);
                coeff_names.push(format!("d{i}"));
            }

            let powers: Vec<&str> =
                q.idxs().iter().map(|i| names[i].as_str()).collect();
            let sign = if numer < 0.0 { "-" } else { "" };

            let _ = writeln!(out, "    f64 Num = {sign}n0;");
            let _ = writeln!(
                out,
                "    f64 Den = {};",
                poly_expr(&units, &coeff_names, &powers)
            );
            let _ = write!(out, "    return Num / Den;");

            return Ok(out);
        }

        // General shape: separate numerator and denominator.
        let mut p_units = Vec::new();
        let mut p_names = Vec::new();

        for (&i, &c) in p.idxs().iter().zip(p.coeffs()) {
            let unit = unit_power(c, &names[&i]);

            if unit.is_none() {
                let _ = writeln!(out, "    f64 n{i} = {};", ftoa(c));
            }

            p_units.push(unit);
            p_names.push(format!("n{i}"));
        }

        let mut q_units = Vec::new();
        let mut q_names = Vec::new();

        for (&i, &c) in q.idxs().iter().zip(q.coeffs()) {
            let unit = unit_power(c, &names[&i]);

            if unit.is_none() {
                let _ = writeln!(out, "    f64 d{i} = {};", ftoa(c));
            }

            q_units.push(unit);
            q_names.push(format!("d{i}"));
        }

        let p_powers: Vec<&str> =
            p.idxs().iter().map(|i| names[i].as_str()).collect();
        let q_powers: Vec<&str> =
            q.idxs().iter().map(|i| names[i].as_str()).collect();

        let _ = writeln!(
            out,
            "    f64 Num = {};",
            poly_expr(&p_units, &p_names, &p_powers)
        );
        let _ = writeln!(
            out,
            "    f64 Den = {};",
            poly_expr(&q_units, &q_names, &q_powers)
        );
        let _ = write!(out, "    return Num / Den;");

        Ok(out)
    }
}

/// A coefficient of magnitude exactly 1 uses the bare power name (when the
/// term has one).
fn unit_power(coeff: f64, power: &str) -> Option<&str> {
    (coeff.abs() == 1.0 && !power.is_empty()).then_some(power)
}

#[cfg(test)]
mod tests {
    use super::super::Polynomial;
    use super::*;

    fn ratpoly(
        p_idxs: &[usize],
        p_coeffs: &[f64],
        q_idxs: &[usize],
        q_coeffs: &[f64],
    ) -> RationalPolynomial {
        RationalPolynomial::new(
            Polynomial::new(1, p_idxs, p_coeffs).unwrap(),
            Polynomial::new(1, q_idxs, q_coeffs).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn constant_denominator_emits_no_division() {
        let code = ratpoly(&[0, 2], &[2.0, 1.0], &[0], &[4.0])
            .code()
            .unwrap();

        assert!(!code.contains('/'));
        assert_eq!(
            code,
            "    f64 x1 = ;\n\
             \x20   f64 x2 = ;\n\
             \x20   f64 c0 = +0.5;\n\
             \x20   f64 c2 = +0.25;\n\
             \x20   return c0 + c2*x2;"
        );
    }

    #[test]
    fn unit_coefficient_elides_multiply() {
        let code = ratpoly(&[0, 2], &[2.0, 4.0], &[0], &[4.0])
            .code()
            .unwrap();

        assert!(code.contains("return c0 + x2;"));
        assert!(!code.contains("c2"));
    }

    #[test]
    fn constant_numerator_shape() {
        let code = ratpoly(&[0], &[3.0], &[0, 1], &[2.0, 4.0])
            .code()
            .unwrap();

        assert_eq!(
            code,
            "    f64 x1 = ;\n\
             \x20   f64 n0 = +0.75;\n\
             \x20   f64 d0 = +0.5;\n\
             \x20   f64 Num = n0;\n\
             \x20   f64 Den = d0 + x1;\n\
             \x20   return Num / Den;"
        );
    }

    #[test]
    fn negative_constant_numerator_negates_at_use() {
        let code = ratpoly(&[0], &[-3.0], &[0, 1], &[2.0, 4.0])
            .code()
            .unwrap();

        assert!(code.contains("f64 n0 = +0.75;"));
        assert!(code.contains("f64 Num = -n0;"));
    }

    #[test]
    fn general_shape() {
        let code =
            ratpoly(&[0, 1], &[2.0, 1.0], &[0, 2], &[3.0, 5.0])
                .code()
                .unwrap();

        assert_eq!(
            code,
            "    f64 x1 = ;\n\
             \x20   f64 x2 = ;\n\
             \x20   f64 n0 = +2.0;\n\
             \x20   f64 d0 = +3.0;\n\
             \x20   f64 d2 = +5.0;\n\
             \x20   f64 Num = n0 + x1;\n\
             \x20   f64 Den = d0 + d2*x2;\n\
             \x20   return Num / Den;"
        );
    }

    #[test]
    fn multivariate_power_names() {
        let p = Polynomial::new(2, [0, 4].as_slice(), [1.0, 2.0].as_slice())
            .unwrap();
        let q = Polynomial::new(2, [0].as_slice(), [1.0].as_slice()).unwrap();
        let code = RationalPolynomial::new(p, q).unwrap().code().unwrap();

        // Index 4 is the xy term.
        assert!(code.contains("f64 x1y1 = ;"));
        assert!(code.contains("c4*x1y1"));
    }

    #[test]
    fn too_many_variables() {
        let p = Polynomial::new(4, [0].as_slice(), [1.0].as_slice()).unwrap();
        let q = Polynomial::new(4, [0].as_slice(), [1.0].as_slice()).unwrap();

        assert!(matches!(
            RationalPolynomial::new(p, q).unwrap().code(),
            Err(CodegenError::TooManyVariables(4))
        ));
    }
}
