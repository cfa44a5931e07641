/// Whether an executable named `binary_name` is reachable through `PATH`.
pub fn binary_exists(binary_name: &str) -> bool {
  which::which(binary_name).is_ok()
}

pub fn env_var_is_set(env_var_name: &str) -> bool {
  std::env::var_os(env_var_name).is_some()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_binary_is_not_found() {
    assert!(!binary_exists("the-calculator-no-such-binary"));
  }

  #[test]
  fn unset_variable_is_reported() {
    assert!(!env_var_is_set("THE_CALCULATOR_SURELY_UNSET_VARIABLE"));
  }
}
