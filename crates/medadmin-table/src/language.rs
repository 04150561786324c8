//! Fixed zh-CN strings for the grid chrome

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginate {
    pub first: String,
    pub previous: String,
    pub next: String,
    pub last: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridLanguage {
    pub processing: String,
    pub search: String,
    pub length_menu: String,
    pub info: String,
    pub info_empty: String,
    pub info_filtered: String,
    pub paginate: Paginate,
}

impl Default for GridLanguage {
    fn default() -> Self {
        Self {
            processing: "处理中...".to_string(),
            search: "搜索:".to_string(),
            length_menu: "显示 _MENU_ 条记录".to_string(),
            info: "显示第 _START_ 至 _END_ 条记录，共 _TOTAL_ 条".to_string(),
            info_empty: "没有记录".to_string(),
            info_filtered: "(从 _MAX_ 条记录中过滤)".to_string(),
            paginate: Paginate {
                first: "首页".to_string(),
                previous: "上一页".to_string(),
                next: "下一页".to_string(),
                last: "末页".to_string(),
            },
        }
    }
}

impl GridLanguage {
    /// Summary line under the table.
    ///
    /// `start` is the zero-based offset of the first shown row, `total` the
    /// filtered count and `max` the unfiltered count.
    pub fn info_text(&self, start: u64, shown: u64, total: u64, max: u64) -> String {
        let mut text = if total == 0 || shown == 0 {
            self.info_empty.clone()
        } else {
            self.info
                .replace("_START_", &(start + 1).to_string())
                .replace("_END_", &(start + shown).to_string())
                .replace("_TOTAL_", &total.to_string())
        };

        if total != max {
            text.push(' ');
            text.push_str(&self.info_filtered.replace("_MAX_", &max.to_string()));
        }
        text
    }

    pub fn length_menu_text(&self, page_length: usize) -> String {
        self.length_menu.replace("_MENU_", &page_length.to_string())
    }
}
