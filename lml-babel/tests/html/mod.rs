mod footnotes;
mod rendering;
mod toc;
