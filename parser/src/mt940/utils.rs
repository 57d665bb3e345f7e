use crate::error::ParseError;

/// Разделяет строку с тегом на сам тег и строку после него
pub(super) fn split_tag_line(line: &str) -> Result<(&str, &str), ParseError> {
    let line = line.trim_start();
    if !line.starts_with(':') {
        return Err(ParseError::Mt940Tag("tag line must start with ':'".into()));
    }

    let rest = &line[1..];
    let tag_end_pos = rest
        .find(':')
        .ok_or_else(|| ParseError::Mt940Tag(format!("bad tag line (unclosed tag): {line}")))?;

    let (tag_raw, value_with_colon) = rest.split_at(tag_end_pos);
    let tag = tag_raw.trim();
    let value = &value_with_colon[1..]; // пропускаем двоеточие

    Ok((tag, value))
}

/// Числовой идентификатор тега: "60F" -> 60, "28C" -> 28
///
/// Буквенный суффикс (F/M/C) уточняет подтип, но грамматика у подтипов общая.
pub(super) fn tag_id(tag: &str) -> Result<u16, ParseError> {
    let digits: &str = tag
        .find(|c: char| !c.is_ascii_digit())
        .map(|pos| &tag[..pos])
        .unwrap_or(tag);

    if digits.is_empty() {
        return Err(ParseError::Mt940Tag(format!(
            "tag has no numeric id: '{tag}'"
        )));
    }

    digits
        .parse()
        .map_err(|_| ParseError::Mt940Tag(format!("tag id out of range: '{tag}'")))
}

/// Одна логическая строка: тег и его значение,
/// многострочные продолжения уже склеены через '\n'
#[derive(Debug, Clone)]
pub(super) struct TagLine {
    pub tag: String,
    pub value: String,
}

/// Склеивает физические строки тела message в логические строки тегов
///
/// Строка, начинающаяся с ':', открывает новый тег; всё остальное -
/// продолжение значения предыдущего тега. Строки до первого тега игнорируются.
pub(super) fn group_tag_lines(lines: &[String]) -> Result<Vec<TagLine>, ParseError> {
    let mut out: Vec<TagLine> = Vec::new();

    for raw_line in lines {
        let line = raw_line.trim_end();
        if line.is_empty() {
            continue;
        }

        let trimmed = line.trim_start();
        if trimmed.starts_with(':') {
            let (tag, value) = split_tag_line(trimmed)?;
            out.push(TagLine {
                tag: tag.to_string(),
                value: value.to_string(),
            });
        } else if let Some(current) = out.last_mut() {
            current.value.push('\n');
            current.value.push_str(trimmed);
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    // split_tag_line

    #[test]
    fn split_tag_line_parses_valid_line() {
        let (tag, value) = split_tag_line(":20:ABC").unwrap();
        assert_eq!(tag, "20");
        assert_eq!(value, "ABC");
    }

    #[test]
    fn split_tag_line_trims_leading_spaces_and_tag() {
        let (tag, value) = split_tag_line("   :25: 123456789 ").unwrap();
        assert_eq!(tag, "25");
        // value не триммится внутри функции
        assert_eq!(value, " 123456789 ");
    }

    #[test]
    fn split_tag_line_fails_if_no_leading_colon() {
        let err = split_tag_line("20:ABC").unwrap_err();
        assert!(matches!(err, ParseError::Mt940Tag(_)));
    }

    #[test]
    fn split_tag_line_fails_if_no_second_colon() {
        let err = split_tag_line(":20ABC").unwrap_err();
        assert!(matches!(err, ParseError::Mt940Tag(_)));
    }

    // tag_id

    #[test]
    fn tag_id_strips_subtag_letter() {
        assert_eq!(tag_id("60F").unwrap(), 60);
        assert_eq!(tag_id("60M").unwrap(), 60);
        assert_eq!(tag_id("28C").unwrap(), 28);
        assert_eq!(tag_id("61").unwrap(), 61);
    }

    #[test]
    fn tag_id_fails_on_non_numeric_tag() {
        assert!(matches!(tag_id("NS"), Err(ParseError::Mt940Tag(_))));
        assert!(matches!(tag_id(""), Err(ParseError::Mt940Tag(_))));
    }

    // group_tag_lines

    #[test]
    fn group_tag_lines_joins_continuations() {
        let lines = vec![
            ":61:2401150115D1500,00NMSCNONREF".to_string(),
            ":86:GIRO 428428".to_string(),
            "BETALINGSKENM. 000000042188659".to_string(),
            ":62F:C240116EUR1,00".to_string(),
        ];

        let grouped = group_tag_lines(&lines).unwrap();

        assert_eq!(grouped.len(), 3);
        assert_eq!(grouped[1].tag, "86");
        assert_eq!(
            grouped[1].value,
            "GIRO 428428\nBETALINGSKENM. 000000042188659"
        );
    }

    #[test]
    fn group_tag_lines_skips_blank_lines_and_preamble() {
        let lines = vec![
            "junk before first tag".to_string(),
            "".to_string(),
            ":20:REF".to_string(),
        ];

        let grouped = group_tag_lines(&lines).unwrap();

        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].tag, "20");
        assert_eq!(grouped[0].value, "REF");
    }
}
