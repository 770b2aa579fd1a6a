//! Compiler feature probes run during the configure phase.

use crate::check::Feature;
use crate::context::{ConfigureContext, DefineValue};
use crate::error::ConfigureError;

/// Fragment exercising `override` and `final` across three inheritance
/// levels. Compiles only when the compiler understands both specifiers.
pub const OVERRIDE_FINAL_FRAGMENT: &str = r#"class Base {
  virtual void f(int a);
};

class Derived : public Base {
  virtual void f(int a) override;
};

class Final : public Derived {
  virtual void f(int a) final;
};
"#;

/// Define recorded when the override/final probe passes.
pub const HAVE_CXX_OVERRIDE_FINAL: &str = "HAVE_CXX_OVERRIDE_FINAL";

/// Probe for `override`/`final` support.
///
/// Non-mandatory: a compiler that rejects the fragment (or is missing
/// entirely) leaves the context untouched and never fails the run.
pub async fn check_override(ctx: &mut ConfigureContext) -> Result<(), ConfigureError> {
    if ctx
        .attempt_compile(
            "Checking for override and final specifiers",
            OVERRIDE_FINAL_FRAGMENT,
            &[Feature::Cxx],
            false,
        )
        .await?
    {
        ctx.define(HAVE_CXX_OVERRIDE_FINAL, DefineValue::Int(1));
    }
    Ok(())
}

/// Configure-phase entry point invoked by the driver.
pub async fn configure(ctx: &mut ConfigureContext) -> Result<(), ConfigureError> {
    check_override(ctx).await
}
