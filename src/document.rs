/// Wraps the generated variables, the optional static stylesheet and the
/// assembled pages in the HTML shell. Nothing is escaped.
pub fn compose(css_variables: &str, stylesheet: Option<&str>, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Document</title>
  <style>
{}

{}
  </style>
</head>
<body>
{}
</body>
</html>"#,
        css_variables,
        stylesheet.unwrap_or_default(),
        body
    )
}
